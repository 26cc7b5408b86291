//! File system access used by discovery and loading

use crate::error::{ConfigError, Result, TaglibError};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Abstract file system for taglib discovery
///
/// Implementations must be shareable across threads: one walk loads
/// directory levels in parallel.
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Immediate child directories, sorted by name
    fn child_dirs(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// The real file system
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| TaglibError::io(path, e))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn child_dirs(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut dirs = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }
        Ok(dirs)
    }
}

/// File name of a path as UTF-8, if it has one
pub(crate) fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|s| s.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_child_dirs_sorted_and_one_level() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("zeta/inner")).unwrap();
        fs::create_dir_all(temp.path().join("alpha")).unwrap();
        fs::write(temp.path().join("file.txt"), "x").unwrap();

        let dirs = RealFileSystem.child_dirs(temp.path()).unwrap();
        let names: Vec<&str> = dirs.iter().filter_map(|d| file_name(d)).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_read_missing_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let err = RealFileSystem
            .read_to_string(&temp.path().join("missing.json"))
            .unwrap_err();
        assert!(err.to_string().contains("missing.json"));
        assert_eq!(err.exit_code(), 2);
    }
}
