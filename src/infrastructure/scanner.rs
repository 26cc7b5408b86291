//! `tags-dir` convention: one tag per immediate child directory
//!
//! ```text
//! components/
//!   my-button/
//!     renderer.js        (or template.marko, exactly one)
//!     marko-tag.json     (optional schema)
//! ```

use super::config::DiscoveryConfig;
use super::fs::{file_name, FileSystem};
use super::loader::{parse_json, TagBody, TaglibLoader};
use crate::domain::schema::{Implementation, TagDefinition, Taglib};
use crate::error::{ConfigError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Assignment that introduces a schema object inside a renderer
fn embedded_schema_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:module\.exports\.tag|exports\.tag|export\s+const\s+tag)\s*=\s*")
            .unwrap()
    })
}

/// Find the object literal assigned to the renderer's exported `tag`
///
/// Returns `None` when the source has no such export.
pub(crate) fn extract_embedded_schema(source: &str) -> Option<std::result::Result<&str, String>> {
    let marker = embedded_schema_regex().find(source)?;
    let rest = &source[marker.end()..];
    if !rest.starts_with('{') {
        return Some(Err("exported tag schema must be an object literal".to_string()));
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(Ok(&rest[..=i]));
                }
            }
            _ => {}
        }
    }

    Some(Err("unterminated tag schema object".to_string()))
}

/// Synthesizes tag definitions from a directory layout
pub struct DirectoryScanner<'a> {
    fs: &'a dyn FileSystem,
    config: &'a DiscoveryConfig,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &'a DiscoveryConfig) -> Self {
        DirectoryScanner { fs, config }
    }

    /// Scan an ordered list of roots
    ///
    /// A tag directory in a later root replaces a same-named one from an
    /// earlier root entirely. The returned taglib takes the first root as
    /// its source.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<Taglib> {
        let mut tags: BTreeMap<String, TagDefinition> = BTreeMap::new();

        for root in roots {
            if !self.fs.is_dir(root) {
                return Err(ConfigError::MissingDirectory { path: root.clone() }.into());
            }

            for dir in self.fs.child_dirs(root)? {
                let Some(name) = file_name(&dir) else {
                    continue;
                };
                if self.config.skip_hidden && name.starts_with('.') {
                    continue;
                }

                let def = self.scan_tag_dir(&dir)?;
                if let Some(previous) = tags.insert(def.name.clone(), def) {
                    debug!(
                        tag = %previous.name,
                        replaced = %previous.provenance.source.display(),
                        "Later tags-dir root overrides tag"
                    );
                }
            }
        }

        let mut taglib = Taglib::new(roots.first().cloned().unwrap_or_default());
        taglib.tags = tags;
        Ok(taglib)
    }

    /// Build the definition for one tag directory
    pub fn scan_tag_dir(&self, dir: &Path) -> Result<TagDefinition> {
        let tag = file_name(dir).unwrap_or_default().to_string();
        debug!(tag = %tag, dir = %dir.display(), "Scanning tag directory");

        let convention = self.convention_files(dir);
        let schema_file = dir.join(&self.config.tag_file);
        let schema_file = self.fs.is_file(&schema_file).then_some(schema_file);
        let embedded = self.embedded_schema(&tag, &convention)?;

        let (body, origin) = match (schema_file, embedded) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::DuplicateSchema {
                    path: dir.to_path_buf(),
                    tag,
                }
                .into())
            }
            (Some(path), None) => {
                let contents = self.fs.read_to_string(&path)?;
                let value = parse_json(&contents, &path)?;
                let map = value.as_object().ok_or_else(|| ConfigError::Parse {
                    path: path.clone(),
                    message: "tag definition must be a JSON object".to_string(),
                })?;
                let body = TaglibLoader::new(self.fs, self.config).parse_tag_body(&tag, map, &path)?;
                (body, Some(path))
            }
            (None, Some((body, renderer))) => (body, Some(renderer)),
            (None, None) => (TagBody::default(), None),
        };

        let mut candidates = convention;
        if let Some(explicit) = body.explicit_implementation(&tag, origin.as_deref().unwrap_or(dir))? {
            if !candidates.contains(&explicit) {
                candidates.push(explicit);
            }
        }

        let implementation = single_candidate(&tag, dir, candidates)?;
        let origin = origin.unwrap_or_else(|| implementation_path(&implementation).to_path_buf());
        Ok(body.into_definition(&tag, implementation, &origin))
    }

    /// Implementation inferred from convention files alone
    pub(crate) fn convention_implementation(
        &self,
        tag: &str,
        dir: &Path,
        origin: &Path,
    ) -> Result<Implementation> {
        single_candidate(tag, origin, self.convention_files(dir))
    }

    fn convention_files(&self, dir: &Path) -> Vec<Implementation> {
        let renderers = self
            .config
            .renderer_files
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| self.fs.is_file(path))
            .map(Implementation::Renderer);
        let templates = self
            .config
            .template_files
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| self.fs.is_file(path))
            .map(Implementation::Template);
        renderers.chain(templates).collect()
    }

    /// Schema exported by a JavaScript renderer, with the renderer path
    fn embedded_schema(
        &self,
        tag: &str,
        convention: &[Implementation],
    ) -> Result<Option<(TagBody, PathBuf)>> {
        for implementation in convention {
            let Implementation::Renderer(renderer) = implementation else {
                continue;
            };
            if renderer.extension().and_then(|e| e.to_str()) != Some("js") {
                continue;
            }

            let source = self.fs.read_to_string(renderer)?;
            let Some(extracted) = extract_embedded_schema(&source) else {
                continue;
            };
            let invalid = |message: String| ConfigError::EmbeddedSchema {
                path: renderer.clone(),
                message,
            };
            let object = extracted.map_err(invalid)?;
            let value: serde_json::Value =
                serde_json::from_str(object).map_err(|e| invalid(e.to_string()))?;
            let map = value
                .as_object()
                .ok_or_else(|| invalid("exported tag schema must be an object".to_string()))?;

            let body = TaglibLoader::new(self.fs, self.config).parse_tag_body(tag, map, renderer)?;
            return Ok(Some((body, renderer.clone())));
        }
        Ok(None)
    }
}

fn single_candidate(tag: &str, path: &Path, mut candidates: Vec<Implementation>) -> Result<Implementation> {
    match candidates.len() {
        0 => Err(ConfigError::MissingImplementation {
            path: path.to_path_buf(),
            tag: tag.to_string(),
        }
        .into()),
        1 => Ok(candidates.remove(0)),
        _ => Err(ConfigError::AmbiguousImplementation {
            path: path.to_path_buf(),
            tag: tag.to_string(),
            candidates: candidates
                .iter()
                .map(|c| implementation_path(c).to_path_buf())
                .collect(),
        }
        .into()),
    }
}

fn implementation_path(implementation: &Implementation) -> &Path {
    match implementation {
        Implementation::Renderer(path) | Implementation::Template(path) => path,
        Implementation::Nested(_) => Path::new(""),
    }
}
