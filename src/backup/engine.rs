//! Backup engine
//!
//! Turns a live bench into a single archive: the manifest first, then one
//! sub-tree per site. Sites are packaged one at a time; a site that cannot be
//! read is recorded as failed and the remaining sites are still backed up.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::archive::{archive_file_name, ArchiveWriter, Compression};
use crate::config::layout::{site_entry_path, BenchLayout, MANIFEST_FILE};
use crate::config::settings::Settings;
use crate::error::{FbmError, FbmResult};
use crate::inspect::{is_valid_bench, BenchInspector};
use crate::models::{BenchManifest, ItemOutcome, OutcomeTally};

/// Options for a single backup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupOptions {
    /// gzip the tar stream
    pub compress: bool,
    /// Replace an existing archive with the same name
    pub overwrite: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            compress: true,
            overwrite: false,
        }
    }
}

/// Result of a backup
#[derive(Debug, Clone, Serialize)]
pub struct BackupResult {
    /// Where the archive was written
    pub archive_path: PathBuf,
    /// The manifest stored in the archive
    pub manifest: BenchManifest,
    /// One outcome per site, in manifest order
    pub sites: Vec<ItemOutcome>,
}

impl BackupResult {
    /// True when every site was copied
    pub fn is_complete(&self) -> bool {
        self.sites.iter().all(ItemOutcome::is_success)
    }

    pub fn has_warnings(&self) -> bool {
        self.sites.iter().any(ItemOutcome::is_warning)
    }

    pub fn failed_sites(&self) -> Vec<&ItemOutcome> {
        self.sites.iter().filter(|s| s.is_failed()).collect()
    }

    pub fn tally(&self) -> OutcomeTally {
        OutcomeTally::from_outcomes(&self.sites)
    }

    /// Get a summary of the backup
    pub fn summary(&self) -> String {
        let status = if self.is_complete() {
            "Backup complete"
        } else {
            "Backup completed with warnings"
        };
        format!(
            "{}: {} app(s), sites {}",
            status,
            self.manifest.apps.len(),
            self.tally()
        )
    }
}

/// Result of backing up one bench out of a directory of benches
#[derive(Debug)]
pub struct BenchBackup {
    pub bench: String,
    pub result: FbmResult<BackupResult>,
}

/// Produces bench archives
#[derive(Debug, Clone, Default)]
pub struct BackupEngine {
    inspector: BenchInspector,
}

/// One filesystem object of a site, checked before anything is written
enum SiteEntry {
    Dir { src: PathBuf, name: PathBuf },
    File { src: PathBuf, name: PathBuf },
    Symlink { src: PathBuf, name: PathBuf },
}

impl BackupEngine {
    /// Create a new BackupEngine
    pub fn new(settings: &Settings) -> Self {
        Self {
            inspector: BenchInspector::new(settings),
        }
    }

    /// Back up the bench at `bench_path` into `output_dir`
    ///
    /// Fails only if the bench is invalid, the archive name is taken, or the
    /// archive cannot be written. Per-site failures are in the result.
    pub fn backup(
        &self,
        bench_path: &Path,
        output_dir: &Path,
        options: &BackupOptions,
    ) -> FbmResult<BackupResult> {
        let manifest = self.inspector.inspect(bench_path)?;
        self.backup_with_manifest(bench_path, manifest, output_dir, options)
    }

    /// Back up a bench using a manifest that was already captured
    pub fn backup_with_manifest(
        &self,
        bench_path: &Path,
        manifest: BenchManifest,
        output_dir: &Path,
        options: &BackupOptions,
    ) -> FbmResult<BackupResult> {
        manifest.validate()?;
        let layout = BenchLayout::new(bench_path);
        let compression = Compression::from_flag(options.compress);
        let archive_path = output_dir.join(archive_file_name(
            &manifest.name,
            manifest.created_at,
            compression,
        ));

        if archive_path.exists() && !options.overwrite {
            return Err(FbmError::OutputExists(archive_path));
        }

        fs::create_dir_all(output_dir).map_err(|e| {
            FbmError::Io(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        info!("Writing backup to {}", archive_path.display());
        let mut writer = ArchiveWriter::create(&archive_path, compression)?;

        let manifest_bytes = match manifest.to_json_vec() {
            Ok(bytes) => bytes,
            Err(e) => {
                writer.abort();
                return Err(e);
            }
        };
        let mtime = manifest.created_at.timestamp().max(0) as u64;
        if let Err(e) = writer.append_bytes(Path::new(MANIFEST_FILE), &manifest_bytes, mtime) {
            writer.abort();
            return Err(FbmError::Io(format!("Failed to write manifest: {}", e)));
        }

        let mut sites = Vec::with_capacity(manifest.sites.len());
        for site in &manifest.sites {
            let site_dir = layout.site_dir(site);
            let entries = match plan_site(site, &site_dir) {
                Ok(entries) => entries,
                Err(reason) => {
                    warn!("Skipping site {}: {}", site, reason);
                    sites.push(ItemOutcome::failed(site, reason));
                    continue;
                }
            };

            // Past the pre-flight, a failed append means the tar stream itself
            // is no longer trustworthy.
            if let Err(e) = append_site(&mut writer, entries) {
                writer.abort();
                return Err(FbmError::Io(format!(
                    "Failed to write site {} into archive: {}",
                    site, e
                )));
            }
            debug!("Backed up site {}", site);
            sites.push(ItemOutcome::success(site));
        }

        let archive_path = writer.finish()?;
        let result = BackupResult {
            archive_path,
            manifest,
            sites,
        };
        info!("{}", result.summary());
        Ok(result)
    }

    /// Back up every valid bench directly below `benches_dir`, or only `bench_name`
    ///
    /// One failing bench does not stop the others.
    pub fn backup_benches(
        &self,
        benches_dir: &Path,
        bench_name: Option<&str>,
        output_dir: &Path,
        options: &BackupOptions,
    ) -> FbmResult<Vec<BenchBackup>> {
        if !benches_dir.is_dir() {
            return Err(FbmError::NotFound {
                entity_type: "Bench directory",
                identifier: benches_dir.display().to_string(),
            });
        }

        if let Some(name) = bench_name {
            let path = benches_dir.join(name);
            let result = self.backup(&path, output_dir, options)?;
            return Ok(vec![BenchBackup {
                bench: name.to_string(),
                result: Ok(result),
            }]);
        }

        let mut benches: Vec<PathBuf> = fs::read_dir(benches_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir() && is_valid_bench(path))
            .collect();
        benches.sort();

        if benches.is_empty() {
            warn!("No valid benches found in {}", benches_dir.display());
        }

        Ok(benches
            .into_iter()
            .map(|path| {
                let bench = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let result = self.backup(&path, output_dir, options);
                if let Err(e) = &result {
                    warn!("Failed to back up bench {}: {}", bench, e);
                }
                BenchBackup { bench, result }
            })
            .collect())
    }
}

/// Walk a site and check every file can be opened
///
/// Nothing is written for a site until its whole tree has been checked, so a
/// failed site leaves no entries in the archive. A symlinked site directory is
/// resolved and archived as a directory; links inside it are kept as links.
fn plan_site(site: &str, site_dir: &Path) -> Result<Vec<SiteEntry>, String> {
    let meta =
        fs::metadata(site_dir).map_err(|e| format!("cannot read {}: {}", site_dir.display(), e))?;
    if !meta.is_dir() {
        return Err(format!("{} is not a directory", site_dir.display()));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(site_dir)
        .follow_links(false)
        .follow_root_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| e.to_string())?;
        let relative = entry
            .path()
            .strip_prefix(site_dir)
            .map_err(|e| e.to_string())?;
        let name = site_entry_path(site, relative);
        let src = entry.path().to_path_buf();
        let file_type = entry.file_type();

        if entry.depth() == 0 || file_type.is_dir() {
            entries.push(SiteEntry::Dir { src, name });
        } else if file_type.is_symlink() {
            entries.push(SiteEntry::Symlink { src, name });
        } else if file_type.is_file() {
            File::open(&src).map_err(|e| format!("cannot read {}: {}", src.display(), e))?;
            entries.push(SiteEntry::File { src, name });
        } else {
            debug!("Ignoring special file {}", src.display());
        }
    }
    Ok(entries)
}

fn append_site(writer: &mut ArchiveWriter, entries: Vec<SiteEntry>) -> std::io::Result<()> {
    for entry in entries {
        match entry {
            SiteEntry::Dir { src, name } => writer.append_dir(&name, &src)?,
            SiteEntry::File { src, name } => {
                let mut file = File::open(&src)?;
                writer.append_file(&name, &mut file)?;
            }
            SiteEntry::Symlink { src, name } => writer.append_symlink(&name, &src)?,
        }
    }
    Ok(())
}
