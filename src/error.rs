//! Custom error types for FBM
//!
//! This module defines the error hierarchy for backup and restore using
//! thiserror. Only archive-level and bench-level problems are errors; a single
//! site or app failing is recorded as an `ItemOutcome` instead.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for FBM operations
#[derive(Error, Debug)]
pub enum FbmError {
    /// The source directory lacks the apps/sites structure
    #[error("Not a valid bench: {path} ({reason})")]
    InvalidBench { path: PathBuf, reason: String },

    /// An archive with the derived name already exists
    #[error("Output already exists: {0}")]
    OutputExists(PathBuf),

    /// The archive cannot be opened or has no manifest
    #[error("Corrupt archive {path}: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    /// The manifest was written by an unknown format version
    #[error("Unsupported archive format version {found} (supported: {supported})")]
    UnsupportedFormat { found: u32, supported: u32 },

    /// The manifest violates its own invariants
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },
}

impl FbmError {
    /// Create an "invalid bench" error
    pub fn invalid_bench(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidBench {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a "corrupt archive" error
    pub fn corrupt_archive(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptArchive {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error means the archive cannot be trusted
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptArchive { .. } | Self::UnsupportedFormat { .. } | Self::InvalidManifest(_)
        )
    }

    /// Check if this error was raised while validating the operation's input
    pub fn is_fatal_input(&self) -> bool {
        self.is_archive_error() || matches!(self, Self::InvalidBench { .. } | Self::OutputExists(_))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<std::io::Error> for FbmError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FbmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for FBM operations
pub type FbmResult<T> = Result<T, FbmError>;
