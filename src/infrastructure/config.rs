//! Discovery configuration

use crate::error::{ConfigError, Result, TaglibError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File naming conventions the engine looks for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Taglib file names checked in each directory, first existing wins
    pub taglib_files: Vec<String>,

    /// Standalone single-tag schema file
    pub tag_file: String,

    /// Directory holding dependency packages
    pub package_dir: String,

    pub renderer_files: Vec<String>,

    pub template_files: Vec<String>,

    /// Ignore directories starting with `.` when scanning
    pub skip_hidden: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            taglib_files: vec!["marko-taglib.json".to_string(), "marko.json".to_string()],
            tag_file: "marko-tag.json".to_string(),
            package_dir: "node_modules".to_string(),
            renderer_files: vec!["renderer.js".to_string(), "index.js".to_string()],
            template_files: vec!["template.marko".to_string(), "index.marko".to_string()],
            skip_hidden: true,
        }
    }
}

impl DiscoveryConfig {
    /// Load config from a TOML file; missing keys keep their defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| TaglibError::io(path, e))?;

        toml::from_str(&contents).map_err(|e| {
            ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Save config as TOML
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        fs::write(path, contents).map_err(|e| TaglibError::io(path, e))
    }

    /// The taglib file in `dir`, if any
    pub fn taglib_file_in(&self, dir: &Path, is_file: impl Fn(&Path) -> bool) -> Option<PathBuf> {
        self.taglib_files
            .iter()
            .map(|name| dir.join(name))
            .find(|path| is_file(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.taglib_files[0], "marko-taglib.json");
        assert_eq!(config.tag_file, "marko-tag.json");
        assert_eq!(config.package_dir, "node_modules");
        assert!(config.skip_hidden);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("taglib.toml");
        let config = DiscoveryConfig {
            package_dir: "deps".to_string(),
            ..DiscoveryConfig::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = DiscoveryConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("taglib.toml");
        fs::write(&path, "tag-file = \"tag.json\"\n").unwrap();

        let loaded = DiscoveryConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.tag_file, "tag.json");
        assert_eq!(loaded.package_dir, "node_modules");
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let result = DiscoveryConfig::load_from_file(&temp.path().join("nope.toml"));

        match result.unwrap_err() {
            TaglibError::Config(ConfigError::Io { .. }) => {}
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("taglib.toml");
        fs::write(&path, "colour = \"blue\"\n").unwrap();

        match DiscoveryConfig::load_from_file(&path).unwrap_err() {
            TaglibError::Config(ConfigError::InvalidConfig { .. }) => {}
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_taglib_file_in_prefers_first_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("marko.json"), "{}").unwrap();
        fs::write(temp.path().join("marko-taglib.json"), "{}").unwrap();

        let config = DiscoveryConfig::default();
        let found = config.taglib_file_in(temp.path(), |p| p.is_file()).unwrap();
        assert!(found.ends_with("marko-taglib.json"));
    }
}
