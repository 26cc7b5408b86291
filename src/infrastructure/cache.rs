//! Per-directory cache of loaded taglibs

use super::config::DiscoveryConfig;
use crate::domain::schema::Taglib;
use crate::error::{Result, TaglibError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::debug;

type Flight = Arc<OnceLock<std::result::Result<Arc<[Taglib]>, TaglibError>>>;

/// Directory plus the conventions it was loaded under
type Key = (PathBuf, DiscoveryConfig);

/// Taglibs of one directory level, keyed by directory and configuration
///
/// Concurrent requests for the same directory share a single load: the
/// first caller runs it and the others block until it finishes. A failed
/// load is handed to everyone waiting on it and then forgotten, so the
/// next request tries again.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: Mutex<HashMap<Key, Flight>>,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached taglibs for `dir` under `config`, running `load` on a miss
    pub fn get_or_load<F>(
        &self,
        dir: &Path,
        config: &DiscoveryConfig,
        load: F,
    ) -> Result<Arc<[Taglib]>>
    where
        F: FnOnce() -> Result<Vec<Taglib>>,
    {
        let key = (dir.to_path_buf(), config.clone());
        let flight = {
            let mut entries = self.lock();
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        let mut loaded_here = false;
        let result = flight
            .get_or_init(|| {
                loaded_here = true;
                debug!(dir = %dir.display(), "Cache miss, loading directory");
                load().map(Arc::from)
            })
            .clone();

        if !loaded_here {
            debug!(dir = %dir.display(), "Cache hit");
        }

        if result.is_err() {
            let mut entries = self.lock();
            if entries.get(&key).is_some_and(|current| Arc::ptr_eq(current, &flight)) {
                entries.remove(&key);
            }
        }

        result
    }

    /// Drop the entries for one directory under any configuration;
    /// returns whether one was cached
    pub fn invalidate(&self, dir: &Path) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(cached, _), _| cached != dir);
        entries.len() < before
    }

    /// Drop every entry whose directory contains `changed`
    pub fn invalidate_path(&self, changed: &Path) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(dir, _), _| !changed.starts_with(dir));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Flight>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
