//! Backup and restore of benches
//!
//! # Architecture
//!
//! - `BackupEngine`: inspects a bench and writes one archive per backup
//! - `RestoreEngine`: validates an archive and materializes it into a target
//! - `archive`: the tar/gzip container shared by both
//!
//! # Archive Format
//!
//! A tar stream, gzip-compressed by default:
//! - `bench_info.json`: the `BenchManifest` (format version, apps, sites)
//! - `site_backups/<site>/...`: each site's directory, verbatim
//!
//! # Example
//!
//! ```rust,ignore
//! use fbm::backup::{BackupEngine, BackupOptions, RestoreEngine, RestoreOptions};
//! use fbm::config::Settings;
//!
//! let engine = BackupEngine::new(&Settings::default());
//! let backup = engine.backup(bench_path, output_dir, &BackupOptions::default())?;
//!
//! let restored = RestoreEngine::new()
//!     .restore(&backup.archive_path, &RestoreOptions::new("/srv/new-bench"))?;
//! println!("{}", restored.summary());
//! ```

pub mod archive;
mod engine;
mod restore;

pub use archive::{list_archives, ArchiveInfo, Compression};
pub use engine::{BackupEngine, BackupOptions, BackupResult, BenchBackup};
pub use restore::{RestoreEngine, RestoreOptions, RestoreResult};
