//! Backup restoration
//!
//! Restores a bench from an archive in two passes. The first pass reads the
//! whole archive, finds and validates the manifest and notes which sites have
//! data; nothing is written to the target until it succeeds. The second pass
//! extracts site sub-trees, one outcome per site.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::archive::open_archive;
use crate::config::layout::{BenchLayout, MANIFEST_FILE, SITE_BACKUPS_DIR};
use crate::error::{FbmError, FbmResult};
use crate::inspect::git;
use crate::models::{AppRecord, BenchManifest, ItemOutcome, OutcomeTally};
use crate::storage::file_io::write_json_atomic;

/// Options for a restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Destination bench root, created if absent
    pub target_dir: PathBuf,
    /// Do not write the app record (or clone apps)
    pub skip_apps: bool,
    /// Do not extract any site
    pub skip_sites: bool,
    /// Replace existing site directories and an existing app record
    pub overwrite: bool,
    /// Clone apps with a recorded remote into `apps/` (best-effort)
    pub clone_apps: bool,
}

impl RestoreOptions {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            skip_apps: false,
            skip_sites: false,
            overwrite: false,
            clone_apps: false,
        }
    }
}

/// Result of a restore operation
#[derive(Debug, Clone, Serialize)]
pub struct RestoreResult {
    /// Manifest read from the archive
    pub manifest: BenchManifest,
    /// Bench root that was restored into
    pub target_dir: PathBuf,
    /// Whether the target already held apps, sites or an app record
    pub target_had_bench: bool,
    /// One outcome per app
    pub apps: Vec<ItemOutcome>,
    /// One outcome per site
    pub sites: Vec<ItemOutcome>,
}

impl RestoreResult {
    /// Check if everything that was attempted succeeded
    pub fn all_restored(&self) -> bool {
        !self.has_warnings()
    }

    pub fn has_warnings(&self) -> bool {
        self.apps
            .iter()
            .chain(self.sites.iter())
            .any(ItemOutcome::is_warning)
    }

    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        format!(
            "Restored into {}: apps {}; sites {}",
            self.target_dir.display(),
            OutcomeTally::from_outcomes(&self.apps),
            OutcomeTally::from_outcomes(&self.sites)
        )
    }
}

/// What the first pass learned about an archive
#[derive(Debug)]
struct ArchiveScan {
    manifest: BenchManifest,
    sites_with_data: HashSet<String>,
}

/// Restores benches from archives
#[derive(Debug, Clone, Default)]
pub struct RestoreEngine;

impl RestoreEngine {
    /// Create a new RestoreEngine
    pub fn new() -> Self {
        Self
    }

    /// Open an archive and return its validated manifest without restoring
    pub fn read_manifest(&self, backup_path: &Path) -> FbmResult<BenchManifest> {
        Ok(self.scan(backup_path)?.manifest)
    }

    /// Restore the archive at `backup_path` according to `options`
    ///
    /// Fails only when the archive or its manifest cannot be trusted; such
    /// failures happen before anything is created at the target.
    pub fn restore(
        &self,
        backup_path: &Path,
        options: &RestoreOptions,
    ) -> FbmResult<RestoreResult> {
        let scan = self.scan(backup_path)?;
        let manifest = scan.manifest;
        let layout = BenchLayout::new(&options.target_dir);

        fs::create_dir_all(layout.root()).map_err(|e| {
            FbmError::Io(format!(
                "Failed to create target directory {}: {}",
                layout.root().display(),
                e
            ))
        })?;

        let target_had_bench = has_bench_content(&layout);
        if target_had_bench {
            warn!(
                "Target {} already contains a bench; restoring additively",
                layout.root().display()
            );
        }

        let apps = if options.skip_apps {
            manifest
                .apps
                .iter()
                .map(|a| ItemOutcome::skipped(&a.name, "skipped by request"))
                .collect()
        } else {
            restore_apps(&manifest, &layout, options)
        };

        let sites = if options.skip_sites {
            manifest
                .sites
                .iter()
                .map(|s| ItemOutcome::skipped(s, "skipped by request"))
                .collect()
        } else {
            restore_sites(backup_path, &manifest, &scan.sites_with_data, &layout, options)
        };

        let result = RestoreResult {
            manifest,
            target_dir: layout.root().to_path_buf(),
            target_had_bench,
            apps,
            sites,
        };
        info!("{}", result.summary());
        Ok(result)
    }

    /// Read every entry once: locate the manifest and the sites with data
    fn scan(&self, backup_path: &Path) -> FbmResult<ArchiveScan> {
        let mut archive = open_archive(backup_path)?;
        let corrupt = |e: std::io::Error| FbmError::corrupt_archive(backup_path, e.to_string());

        let mut manifest_bytes = None;
        let mut sites_with_data = HashSet::new();

        for entry in archive.entries().map_err(corrupt)? {
            let mut entry = entry.map_err(corrupt)?;
            let path = entry.path().map_err(corrupt)?.into_owned();

            if path == Path::new(MANIFEST_FILE) {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes).map_err(corrupt)?;
                manifest_bytes = Some(bytes);
            } else if let Some((site, _)) = split_site_path(&path) {
                sites_with_data.insert(site);
            }

            // Drain so a truncated body is caught here rather than on extraction
            std::io::copy(&mut entry, &mut std::io::sink()).map_err(corrupt)?;
        }

        let bytes = manifest_bytes.ok_or_else(|| {
            FbmError::corrupt_archive(backup_path, format!("{} not found", MANIFEST_FILE))
        })?;
        let manifest = BenchManifest::from_json_slice(&bytes)?;

        debug!(
            "Archive {} holds data for {} site(s)",
            backup_path.display(),
            sites_with_data.len()
        );
        Ok(ArchiveScan {
            manifest,
            sites_with_data,
        })
    }
}

/// Split `site_backups/<site>/<rest>` into the site name and a safe relative path
fn split_site_path(path: &Path) -> Option<(String, PathBuf)> {
    let mut components = path.components();
    match components.next()? {
        Component::Normal(first) if first == SITE_BACKUPS_DIR => {}
        _ => return None,
    }
    let site = match components.next()? {
        Component::Normal(site) => site.to_string_lossy().to_string(),
        _ => return None,
    };

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some((site, relative))
}

fn has_bench_content(layout: &BenchLayout) -> bool {
    let non_empty = |dir: PathBuf| {
        fs::read_dir(dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    };
    non_empty(layout.apps_dir())
        || non_empty(layout.sites_dir())
        || layout.app_record_file().exists()
}

/// Record the expected apps at the target, and optionally clone them
fn restore_apps(
    manifest: &BenchManifest,
    layout: &BenchLayout,
    options: &RestoreOptions,
) -> Vec<ItemOutcome> {
    let record = layout.app_record_file();

    if record.exists() && !options.overwrite {
        warn!("App record {} already exists; not overwriting", record.display());
        return manifest
            .apps
            .iter()
            .map(|a| {
                ItemOutcome::collision(&a.name, format!("{} already exists", MANIFEST_FILE))
            })
            .collect();
    }

    if let Err(e) = write_json_atomic(&record, manifest) {
        warn!("Failed to write app record: {}", e);
        return manifest
            .apps
            .iter()
            .map(|a| ItemOutcome::failed(&a.name, format!("could not record app: {}", e)))
            .collect();
    }

    manifest
        .apps
        .iter()
        .map(|app| {
            if options.clone_apps {
                clone_app(app, layout)
            } else {
                ItemOutcome::success(&app.name)
            }
        })
        .collect()
}

fn clone_app(app: &AppRecord, layout: &BenchLayout) -> ItemOutcome {
    let Some(remote) = app.git_remote.as_deref() else {
        return ItemOutcome::skipped(&app.name, "recorded; no git remote to clone");
    };

    let dest = layout.app_dir(&app.name);
    if dest.exists() {
        return ItemOutcome::skipped(&app.name, "recorded; already present");
    }

    if let Err(e) = fs::create_dir_all(layout.apps_dir()) {
        return ItemOutcome::failed(&app.name, format!("recorded; clone failed: {}", e));
    }

    info!("Cloning {} from {}", app.name, remote);
    let checkout_to = app.git_revision.as_deref().or(app.git_branch.as_deref());
    let cloned = git::clone_repo(remote, &dest).and_then(|_| match checkout_to {
        Some(rev) => git::checkout(&dest, rev),
        None => Ok(()),
    });

    match cloned {
        Ok(()) => ItemOutcome::success(&app.name),
        Err(e) => {
            warn!("Failed to clone {}: {}", app.name, e);
            ItemOutcome::failed(&app.name, format!("recorded; clone failed: {}", e))
        }
    }
}

/// Per-site state during extraction
enum SitePlan {
    Extract,
    Done(ItemOutcome),
}

fn restore_sites(
    backup_path: &Path,
    manifest: &BenchManifest,
    sites_with_data: &HashSet<String>,
    layout: &BenchLayout,
    options: &RestoreOptions,
) -> Vec<ItemOutcome> {
    let mut plans: HashMap<&str, SitePlan> = HashMap::new();

    for site in &manifest.sites {
        let target = layout.site_dir(site);
        let plan = if !sites_with_data.contains(site) {
            SitePlan::Done(ItemOutcome::failed(site, "no data for site in archive"))
        } else if target.exists() {
            if options.overwrite {
                match fs::remove_dir_all(&target) {
                    Ok(()) => SitePlan::Extract,
                    Err(e) => SitePlan::Done(ItemOutcome::failed(
                        site,
                        format!("could not replace existing site: {}", e),
                    )),
                }
            } else {
                warn!("Site {} already exists at target; skipping", site);
                SitePlan::Done(ItemOutcome::collision(
                    site,
                    format!("{} already exists", target.display()),
                ))
            }
        } else {
            SitePlan::Extract
        };
        plans.insert(site.as_str(), plan);
    }

    if plans.values().any(|p| matches!(p, SitePlan::Extract)) {
        if let Err(reason) = extract_sites(backup_path, layout, &mut plans) {
            warn!("Archive became unreadable during extraction: {}", reason);
            for (site, plan) in plans.iter_mut() {
                if matches!(plan, SitePlan::Extract) {
                    discard_partial_site(layout, site);
                    *plan = SitePlan::Done(ItemOutcome::failed(*site, reason.clone()));
                }
            }
        }
    }

    manifest
        .sites
        .iter()
        .map(|site| match plans.remove(site.as_str()) {
            Some(SitePlan::Done(outcome)) => outcome,
            _ => ItemOutcome::success(site),
        })
        .collect()
}

/// Second pass: unpack entries of every site still marked for extraction
///
/// An error on one entry fails that site only. `Err` means the archive could
/// no longer be read at all.
fn extract_sites(
    backup_path: &Path,
    layout: &BenchLayout,
    plans: &mut HashMap<&str, SitePlan>,
) -> Result<(), String> {
    let mut archive = open_archive(backup_path).map_err(|e| e.to_string())?;
    let entries = archive.entries().map_err(|e| e.to_string())?;

    for entry in entries {
        let mut entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path().map_err(|e| e.to_string())?.into_owned();
        let Some((site, relative)) = split_site_path(&path) else {
            continue;
        };
        let Some(plan) = plans.get_mut(site.as_str()) else {
            debug!("Ignoring data for unlisted site {}", site);
            continue;
        };
        if !matches!(plan, SitePlan::Extract) {
            continue;
        }

        let site_dir = layout.site_dir(&site);
        let dest = if relative.as_os_str().is_empty() {
            site_dir.clone()
        } else {
            site_dir.join(&relative)
        };
        let unpacked = if entry.header().entry_type().is_hard_link() {
            Err(format!("refusing to extract hard link {}", relative.display()))
        } else if let Some(link) = symlinked_ancestor(&site_dir, &relative) {
            Err(format!(
                "refusing to extract {} through symbolic link {}",
                relative.display(),
                link.display()
            ))
        } else {
            dest.parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|_| entry.unpack(&dest).map(|_| ()))
                .map_err(|e| format!("cannot extract {}: {}", relative.display(), e))
        };

        if let Err(reason) = unpacked {
            warn!("Failed to restore site {}: {}", site, reason);
            discard_partial_site(layout, &site);
            *plan = SitePlan::Done(ItemOutcome::failed(&site, reason));
        }
    }
    Ok(())
}

/// First symlink among `site_dir` and the directories leading to `relative`
///
/// Entries are only unpacked when this is `None`, so an archived link can
/// never redirect a later entry outside the site.
fn symlinked_ancestor(site_dir: &Path, relative: &Path) -> Option<PathBuf> {
    let mut parents = relative.parent().map(Path::components).into_iter().flatten();
    let mut current = site_dir.to_path_buf();
    loop {
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => return Some(current),
            Ok(_) => {}
            Err(_) => return None,
        }
        current.push(parents.next()?);
    }
}

/// Remove what a failed extraction left of a site
///
/// The directory was absent (or removed for overwrite) before this restore
/// started, so everything in it came from the archive.
fn discard_partial_site(layout: &BenchLayout, site: &str) {
    let site_dir = layout.site_dir(site);
    if fs::symlink_metadata(&site_dir).is_err() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(&site_dir) {
        warn!(
            "Failed to remove partially restored site {}: {}",
            site_dir.display(),
            e
        );
    }
}
