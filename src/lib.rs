//! FBM - Frappe Bench Manager
//!
//! This library backs up and restores a bench: a directory holding installed
//! apps (`apps/`, usually git checkouts) and tenant sites (`sites/`). A backup
//! is one archive carrying a manifest of the apps and their git state plus a
//! verbatim copy of every site; a restore validates that archive and rebuilds
//! sites and the app record in a target directory.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings, path resolution and the fixed bench layout
//! - `error`: Custom error types
//! - `models`: The bench manifest and per-item outcomes
//! - `inspect`: Read-only bench inspection, including git metadata
//! - `backup`: Archive container, backup engine and restore engine
//! - `storage`: Atomic JSON file helpers
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the `fbm` binary
//!
//! # Example
//!
//! ```rust,ignore
//! let backup = fbm::backup("/srv/frappe-bench".as_ref(), "backups".as_ref(), true)?;
//! println!("{}", backup.summary());
//!
//! let restored = fbm::restore(&backup.archive_path, "/srv/restored".as_ref(), false, false)?;
//! println!("{}", restored.summary());
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod models;
pub mod storage;

use std::path::Path;

pub use backup::{
    BackupEngine, BackupOptions, BackupResult, RestoreEngine, RestoreOptions, RestoreResult,
};
pub use error::{FbmError, FbmResult};
pub use inspect::BenchInspector;
pub use models::{AppRecord, BenchManifest, ItemOutcome, ItemStatus};

/// Back up the bench at `bench_path` into `output_dir` with default settings
pub fn backup(bench_path: &Path, output_dir: &Path, compress: bool) -> FbmResult<BackupResult> {
    let options = BackupOptions {
        compress,
        ..BackupOptions::default()
    };
    BackupEngine::default().backup(bench_path, output_dir, &options)
}

/// Restore `backup_path` into `target_dir`
pub fn restore(
    backup_path: &Path,
    target_dir: &Path,
    skip_apps: bool,
    skip_sites: bool,
) -> FbmResult<RestoreResult> {
    let options = RestoreOptions {
        skip_apps,
        skip_sites,
        ..RestoreOptions::new(target_dir)
    };
    RestoreEngine::new().restore(backup_path, &options)
}
