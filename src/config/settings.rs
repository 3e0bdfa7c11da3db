//! User settings for FBM
//!
//! Manages defaults for backup output, which `sites/` entries are not sites,
//! which git remote identifies an app, and the log level.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::FbmPaths;
use crate::error::FbmError;
use crate::storage::file_io::{read_json, write_json_atomic};

/// User settings for FBM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Where backups go when `--output` is not given
    #[serde(default = "default_output_dir")]
    pub default_output_dir: PathBuf,

    /// Whether backups are gzip-compressed unless `--no-compress` is passed
    #[serde(default = "default_compress")]
    pub compress: bool,

    /// Directories under `sites/` that are shared, not tenant sites
    #[serde(default = "default_excluded_site_entries")]
    pub excluded_site_entries: Vec<String>,

    /// Remotes tried in order when recording an app's origin
    #[serde(default = "default_preferred_remotes")]
    pub preferred_remotes: Vec<String>,

    /// Log filter used when `RUST_LOG` and `--log-level` are absent
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_compress() -> bool {
    true
}

fn default_excluded_site_entries() -> Vec<String> {
    vec!["assets".to_string(), "archived_sites".to_string()]
}

fn default_preferred_remotes() -> Vec<String> {
    vec!["upstream".to_string(), "origin".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_output_dir: default_output_dir(),
            compress: default_compress(),
            excluded_site_entries: default_excluded_site_entries(),
            preferred_remotes: default_preferred_remotes(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &FbmPaths) -> Result<Self, FbmError> {
        read_json(paths.settings_file())
            .map_err(|e| FbmError::Config(format!("Failed to load settings: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &FbmPaths) -> Result<(), FbmError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Whether a `sites/` entry with this name is shared rather than a site
    pub fn is_excluded_site_entry(&self, name: &str) -> bool {
        name.starts_with('.') || self.excluded_site_entries.iter().any(|e| e == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.compress);
        assert_eq!(settings.default_output_dir, PathBuf::from("backups"));
        assert_eq!(settings.preferred_remotes, vec!["upstream", "origin"]);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FbmPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.compress = false;
        settings.excluded_site_entries.push("shared".to_string());

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FbmPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"compress": false}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert!(!loaded.compress);
        assert_eq!(loaded.log_level, "info");
        assert_eq!(loaded.excluded_site_entries, vec!["assets", "archived_sites"]);
    }

    #[test]
    fn test_excluded_site_entries() {
        let settings = Settings::default();
        assert!(settings.is_excluded_site_entry("assets"));
        assert!(settings.is_excluded_site_entry(".git"));
        assert!(!settings.is_excluded_site_entry("erp.local"));
    }
}
