//! Taglib discovery use case

use crate::domain::schema::{DiscoveryRank, Taglib};
use crate::domain::{NestedTagResolver, TagRegistry};
use crate::error::{ConfigError, Result};
use crate::infrastructure::fs::file_name;
use crate::infrastructure::{
    DiscoveryCache, DiscoveryConfig, FileSystem, RealFileSystem, TaglibLoader,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Builds the tag registry visible to one template
///
/// The template's directory and each of its ancestors form one level.
/// Within a level the directory's own taglib comes first, then the
/// taglibs of its dependency packages in name order. Nearer levels shadow
/// farther ones; fallback taglibs rank after every level.
pub struct TaglibDiscoveryWalker {
    fs: Arc<dyn FileSystem>,
    config: DiscoveryConfig,
    cache: Arc<DiscoveryCache>,
    fallback: Vec<Taglib>,
}

impl TaglibDiscoveryWalker {
    /// Walker over the real file system with its own cache
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_file_system(Arc::new(RealFileSystem), config)
    }

    pub fn with_file_system(fs: Arc<dyn FileSystem>, config: DiscoveryConfig) -> Self {
        TaglibDiscoveryWalker {
            fs,
            config,
            cache: Arc::new(DiscoveryCache::new()),
            fallback: Vec::new(),
        }
    }

    /// Share a cache with other walkers
    ///
    /// Entries are keyed by directory and configuration, so walkers with
    /// different naming conventions never see each other's taglibs.
    pub fn with_cache(mut self, cache: Arc<DiscoveryCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Register a taglib consulted after every discovered level
    pub fn with_fallback(mut self, taglib: Taglib) -> Self {
        self.fallback.push(taglib);
        self
    }

    /// Registry for the template at `template`
    ///
    /// Directory levels load in parallel; the merge only depends on each
    /// taglib's rank, never on which level finished first.
    pub fn discover(&self, template: &Path) -> Result<TagRegistry> {
        if !template.is_absolute() {
            return Err(ConfigError::RelativeTemplatePath {
                path: template.to_path_buf(),
            }
            .into());
        }

        let levels: Vec<&Path> = template
            .parent()
            .map(|dir| dir.ancestors().collect())
            .unwrap_or_default();
        debug!(template = %template.display(), levels = levels.len(), "Discovering taglibs");

        let loaded: Vec<Result<Arc<[Taglib]>>> = levels
            .par_iter()
            .map(|dir| self.cache.get_or_load(dir, &self.config, || self.load_level(dir)))
            .collect();

        let mut taglibs = Vec::new();
        for (level, result) in loaded.into_iter().enumerate() {
            for (slot, taglib) in result?.iter().enumerate() {
                taglibs.push(taglib.clone().ranked(DiscoveryRank::new(level, slot)));
            }
        }
        for (slot, taglib) in self.fallback.iter().enumerate() {
            let expanded = NestedTagResolver::expand(taglib.clone())?;
            taglibs.push(expanded.ranked(DiscoveryRank::new(levels.len(), slot)));
        }

        TagRegistry::merge(taglibs)
    }

    /// Load every taglib contributed by one directory, in slot order
    fn load_level(&self, dir: &Path) -> Result<Vec<Taglib>> {
        let loader = TaglibLoader::new(self.fs.as_ref(), &self.config);
        let mut taglibs = Vec::new();

        if let Some(file) = self.config.taglib_file_in(dir, |p| self.fs.is_file(p)) {
            debug!(path = %file.display(), "Found directory taglib");
            taglibs.push(NestedTagResolver::expand(loader.load_file(&file)?)?);
        }

        for file in self.package_taglibs(dir)? {
            debug!(path = %file.display(), "Found package taglib");
            taglibs.push(NestedTagResolver::expand(loader.load_file(&file)?)?);
        }

        Ok(taglibs)
    }

    /// Taglib files of the packages under `dir`, scoped packages included
    fn package_taglibs(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let packages_dir = dir.join(&self.config.package_dir);
        if !self.fs.is_dir(&packages_dir) {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for package in self.fs.child_dirs(&packages_dir)? {
            let name = file_name(&package).unwrap_or_default();
            if self.config.skip_hidden && name.starts_with('.') {
                continue;
            }

            if name.starts_with('@') {
                for scoped in self.fs.child_dirs(&package)? {
                    files.extend(self.config.taglib_file_in(&scoped, |p| self.fs.is_file(p)));
                }
            } else {
                files.extend(self.config.taglib_file_in(&package, |p| self.fs.is_file(p)));
            }
        }
        Ok(files)
    }
}
