//! Bench inspection
//!
//! `BenchInspector` walks a live bench read-only and produces a
//! `BenchManifest`: the installed apps with their git state and the set of
//! tenant sites.

pub mod git;

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::layout::BenchLayout;
use crate::config::settings::Settings;
use crate::error::{FbmError, FbmResult};
use crate::models::{AppRecord, BenchManifest};

/// Check if the given path has the apps/sites structure of a bench
pub fn is_valid_bench(path: &Path) -> bool {
    let layout = BenchLayout::new(path);
    layout.apps_dir().is_dir() && layout.sites_dir().is_dir()
}

/// Reads a bench directory into a manifest
#[derive(Debug, Clone)]
pub struct BenchInspector {
    settings: Settings,
}

impl Default for BenchInspector {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl BenchInspector {
    /// Create an inspector using the site exclusions and remote preference from settings
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    /// Capture the manifest of the bench at `bench_path`
    ///
    /// Fails with `InvalidBench` when `apps/` or `sites/` is missing or not a
    /// directory. Apps without git metadata are not an error.
    pub fn inspect(&self, bench_path: &Path) -> FbmResult<BenchManifest> {
        let layout = BenchLayout::new(bench_path);

        for (dir, label) in [(layout.apps_dir(), "apps"), (layout.sites_dir(), "sites")] {
            if !dir.is_dir() {
                return Err(FbmError::invalid_bench(
                    bench_path,
                    format!("{} directory missing", label),
                ));
            }
        }

        let apps = self.discover_apps(&layout)?;
        let sites = self.discover_sites(&layout)?;

        info!(
            "Inspected bench {}: {} app(s), {} site(s)",
            bench_path.display(),
            apps.len(),
            sites.len()
        );

        Ok(BenchManifest::new(layout.name(), apps, sites))
    }

    fn discover_apps(&self, layout: &BenchLayout) -> FbmResult<Vec<AppRecord>> {
        let mut names = list_subdirectories(&layout.apps_dir())?;
        names.retain(|n| !n.starts_with('.'));
        let names = order_by_app_list(names, &read_app_list(layout));

        Ok(names
            .into_iter()
            .map(|name| {
                let dir = layout.app_dir(&name);
                let info = git::read_git_info(&dir, &self.settings.preferred_remotes);
                if git::is_git_checkout(&dir) && info.revision.is_none() {
                    warn!("Could not read git revision for app {}", name);
                }
                debug!("App {}: {:?}", name, info);
                AppRecord {
                    name,
                    git_remote: info.remote,
                    git_revision: info.revision,
                    git_branch: info.branch,
                    has_uncommitted_changes: info.dirty,
                }
            })
            .collect())
    }

    fn discover_sites(&self, layout: &BenchLayout) -> FbmResult<Vec<String>> {
        let mut sites = list_subdirectories(&layout.sites_dir())?;
        sites.retain(|name| {
            let excluded = self.settings.is_excluded_site_entry(name);
            if excluded {
                debug!("Skipping shared sites entry {}", name);
            }
            !excluded
        });
        Ok(sites)
    }
}

/// Sorted names of the directories directly inside `dir`
fn list_subdirectories(dir: &Path) -> FbmResult<Vec<String>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| FbmError::Io(format!("Failed to read {}: {}", dir.display(), e)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| FbmError::Io(format!("Failed to read directory entry: {}", e)))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// App names from `sites/apps.txt`, in install order
fn read_app_list(layout: &BenchLayout) -> Vec<String> {
    fs::read_to_string(layout.apps_list_file())
        .map(|contents| {
            contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Listed apps first in list order, then the rest as given
fn order_by_app_list(found: Vec<String>, app_list: &[String]) -> Vec<String> {
    let (mut listed, rest): (Vec<_>, Vec<_>) =
        found.into_iter().partition(|n| app_list.contains(n));
    listed.sort_by_key(|n| app_list.iter().position(|a| a == n));
    listed.extend(rest);
    listed
}

#[cfg(test)]
mod tests {
    use super::git::{git_available, test_support::init_repo};
    use super::*;
    use tempfile::TempDir;

    fn create_bench(root: &Path) {
        fs::create_dir_all(root.join("apps/frappe")).unwrap();
        fs::create_dir_all(root.join("apps/erpnext")).unwrap();
        fs::create_dir_all(root.join("sites/assets")).unwrap();
        fs::create_dir_all(root.join("sites/a.local")).unwrap();
        fs::create_dir_all(root.join("sites/b.local")).unwrap();
        fs::write(root.join("sites/common_site_config.json"), "{}").unwrap();
    }

    #[test]
    fn test_inspect_plain_bench() {
        let temp = TempDir::new().unwrap();
        let bench = temp.path().join("frappe-bench");
        create_bench(&bench);

        let manifest = BenchInspector::default().inspect(&bench).unwrap();

        assert_eq!(manifest.name, "frappe-bench");
        assert_eq!(manifest.sites, vec!["a.local", "b.local"]);
        let names: Vec<_> = manifest.apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["erpnext", "frappe"]);
        assert!(manifest.apps.iter().all(|a| a.git_revision.is_none()));
    }

    #[test]
    fn test_apps_follow_app_list_order() {
        let temp = TempDir::new().unwrap();
        let bench = temp.path().join("bench");
        create_bench(&bench);
        fs::create_dir_all(bench.join("apps/zeta")).unwrap();
        fs::write(bench.join("sites/apps.txt"), "frappe\nerpnext\n").unwrap();

        let manifest = BenchInspector::default().inspect(&bench).unwrap();
        let names: Vec<_> = manifest.apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["frappe", "erpnext", "zeta"]);
    }

    #[test]
    fn test_missing_structure_is_invalid() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("apps")).unwrap();

        let err = BenchInspector::default().inspect(temp.path()).unwrap_err();
        assert!(matches!(err, FbmError::InvalidBench { .. }));
        assert!(!is_valid_bench(temp.path()));
    }

    #[test]
    fn test_sites_file_instead_of_dir_is_invalid() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("apps")).unwrap();
        fs::write(temp.path().join("sites"), "").unwrap();

        let err = BenchInspector::default().inspect(temp.path()).unwrap_err();
        assert!(matches!(err, FbmError::InvalidBench { .. }));
    }

    #[test]
    fn test_custom_exclusions() {
        let temp = TempDir::new().unwrap();
        create_bench(temp.path());

        let mut settings = Settings::default();
        settings.excluded_site_entries = vec!["a.local".to_string()];
        let manifest = BenchInspector::new(&settings).inspect(temp.path()).unwrap();

        assert_eq!(manifest.sites, vec!["assets", "b.local"]);
    }

    #[test]
    fn test_inspection_is_repeatable() {
        let temp = TempDir::new().unwrap();
        create_bench(temp.path());
        if git_available() {
            init_repo(
                &temp.path().join("apps/frappe"),
                Some(("upstream", "https://github.com/frappe/frappe")),
            );
        }

        let inspector = BenchInspector::default();
        let first = inspector.inspect(temp.path()).unwrap();
        let second = inspector.inspect(temp.path()).unwrap();
        assert!(first.same_contents(&second));
    }

    #[test]
    fn test_git_app_metadata() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        create_bench(temp.path());
        let rev = init_repo(
            &temp.path().join("apps/frappe"),
            Some(("upstream", "https://github.com/frappe/frappe")),
        );

        let manifest = BenchInspector::default().inspect(temp.path()).unwrap();
        let frappe = manifest.apps.iter().find(|a| a.name == "frappe").unwrap();
        assert_eq!(frappe.git_revision.as_deref(), Some(rev.as_str()));
        assert_eq!(
            frappe.git_remote.as_deref(),
            Some("https://github.com/frappe/frappe")
        );
        let erpnext = manifest.apps.iter().find(|a| a.name == "erpnext").unwrap();
        assert!(!erpnext.is_git_checkout());
    }
}
