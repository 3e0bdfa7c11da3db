//! Path management for FBM
//!
//! Provides XDG-compliant path resolution for the tool's own configuration.
//!
//! ## Path Resolution Order
//!
//! 1. `FBM_CONFIG_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/fbm` or `~/.config/fbm`
//! 3. Windows: `%APPDATA%\fbm`

use std::path::PathBuf;

use crate::error::FbmError;

/// Manages the paths used by FBM itself (not the bench being backed up)
#[derive(Debug, Clone)]
pub struct FbmPaths {
    /// Base directory for FBM configuration
    base_dir: PathBuf,
}

impl FbmPaths {
    /// Create a new FbmPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, FbmError> {
        let base_dir = if let Ok(custom) = std::env::var("FBM_CONFIG_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create FbmPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/fbm/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), FbmError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| FbmError::Io(format!("Failed to create config directory: {}", e)))
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, FbmError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| FbmError::Config("HOME environment variable not set".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("fbm"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, FbmError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| FbmError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("fbm"))
}
