//! Fixed names of the bench layout and the archive layout.
//!
//! A bench root holds `apps/` (one checkout per app) and `sites/` (one
//! directory per tenant site plus shared files such as `apps.txt`). An archive
//! holds `bench_info.json` at its root and `site_backups/<site>/...` below.

use std::path::{Path, PathBuf};

/// Directory holding app checkouts, relative to the bench root
pub const APPS_DIR: &str = "apps";

/// Directory holding sites, relative to the bench root
pub const SITES_DIR: &str = "sites";

/// Ordered list of installed apps, relative to the sites directory
pub const APPS_LIST_FILE: &str = "apps.txt";

/// Manifest path inside an archive (and the restored app record in a target)
pub const MANIFEST_FILE: &str = "bench_info.json";

/// Prefix for per-site sub-trees inside an archive
pub const SITE_BACKUPS_DIR: &str = "site_backups";

/// Resolves bench-relative locations for one bench root
#[derive(Debug, Clone)]
pub struct BenchLayout {
    root: PathBuf,
}

impl BenchLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The bench root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bench name, taken from the root directory name
    pub fn name(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .or_else(|| self.root.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "bench".to_string())
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.root.join(APPS_DIR)
    }

    pub fn app_dir(&self, app: &str) -> PathBuf {
        self.apps_dir().join(app)
    }

    pub fn sites_dir(&self) -> PathBuf {
        self.root.join(SITES_DIR)
    }

    pub fn site_dir(&self, site: &str) -> PathBuf {
        self.sites_dir().join(site)
    }

    pub fn apps_list_file(&self) -> PathBuf {
        self.sites_dir().join(APPS_LIST_FILE)
    }

    /// Where restore records the expected apps
    pub fn app_record_file(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }
}

/// Archive entry path for a file or directory belonging to `site`
pub fn site_entry_path(site: &str, relative: &Path) -> PathBuf {
    let base = Path::new(SITE_BACKUPS_DIR).join(site);
    if relative.as_os_str().is_empty() {
        base
    } else {
        base.join(relative)
    }
}
