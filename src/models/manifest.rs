//! Bench manifest model
//!
//! The manifest is the archive's self-description: which apps were installed
//! (with whatever git state could be read) and which sites existed. It is the
//! only contract shared by backup and restore.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FbmError, FbmResult};

/// Archive layout version written by this build
pub const FORMAT_VERSION: u32 = 1;

/// An installed app and its version-control state
///
/// Git fields are best-effort: a plain directory has all of them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    /// App directory name under `apps/`
    pub name: String,

    /// URL of the app's remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_remote: Option<String>,

    /// Commit hash checked out at capture time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_revision: Option<String>,

    /// Branch checked out at capture time (unset when detached)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,

    /// Whether the working tree had uncommitted changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_uncommitted_changes: Option<bool>,
}

impl AppRecord {
    /// Create a record for an app without git metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            git_remote: None,
            git_revision: None,
            git_branch: None,
            has_uncommitted_changes: None,
        }
    }

    /// Whether any git metadata was captured
    pub fn is_git_checkout(&self) -> bool {
        self.git_revision.is_some()
    }
}

impl fmt::Display for AppRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match (&self.git_branch, &self.git_revision) {
            (Some(branch), Some(rev)) => write!(f, " ({} @ {})", branch, short_rev(rev))?,
            (None, Some(rev)) => write!(f, " (@ {})", short_rev(rev))?,
            _ => {}
        }
        if self.has_uncommitted_changes == Some(true) {
            write!(f, " [dirty]")?;
        }
        Ok(())
    }
}

fn short_rev(rev: &str) -> &str {
    rev.get(..12).unwrap_or(rev)
}

/// Structured description of a bench captured at backup time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchManifest {
    /// Archive layout version
    pub format_version: u32,

    /// Bench directory name
    #[serde(default)]
    pub name: String,

    /// When the manifest was captured
    pub created_at: DateTime<Utc>,

    /// Installed apps in discovery order
    #[serde(default)]
    pub apps: Vec<AppRecord>,

    /// Site names present at capture time
    #[serde(default)]
    pub sites: Vec<String>,
}

impl BenchManifest {
    /// Create a manifest stamped with the current time and format version
    pub fn new(name: impl Into<String>, apps: Vec<AppRecord>, sites: Vec<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            name: name.into(),
            created_at: Utc::now(),
            apps,
            sites,
        }
    }

    /// Parse and validate a manifest read from an archive
    ///
    /// The format version is checked on the raw document before the rest of
    /// the shape is trusted.
    pub fn from_json_slice(bytes: &[u8]) -> FbmResult<Self> {
        let raw: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| FbmError::InvalidManifest(format!("not valid JSON: {}", e)))?;

        let found = raw
            .get("format_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| FbmError::InvalidManifest("missing format_version".into()))?;

        if found != u64::from(FORMAT_VERSION) {
            return Err(FbmError::UnsupportedFormat {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: FORMAT_VERSION,
            });
        }

        let manifest: BenchManifest = serde_json::from_value(raw)
            .map_err(|e| FbmError::InvalidManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize for storage inside an archive
    pub fn to_json_vec(&self) -> FbmResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| FbmError::Json(format!("Failed to serialize manifest: {}", e)))
    }

    /// Check the uniqueness and naming invariants
    pub fn validate(&self) -> FbmResult<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(FbmError::UnsupportedFormat {
                found: self.format_version,
                supported: FORMAT_VERSION,
            });
        }

        let mut seen = HashSet::new();
        for app in &self.apps {
            validate_name("app", &app.name)?;
            if !seen.insert(app.name.as_str()) {
                return Err(FbmError::InvalidManifest(format!(
                    "duplicate app '{}'",
                    app.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for site in &self.sites {
            validate_name("site", site)?;
            if !seen.insert(site.as_str()) {
                return Err(FbmError::InvalidManifest(format!(
                    "duplicate site '{}'",
                    site
                )));
            }
        }

        Ok(())
    }

    /// Whether two manifests describe the same apps and sites
    pub fn same_contents(&self, other: &Self) -> bool {
        self.apps == other.apps && self.sites == other.sites
    }

    /// Check if a site is listed
    pub fn has_site(&self, site: &str) -> bool {
        self.sites.iter().any(|s| s == site)
    }
}

/// Names become directory names on restore, so they must be a single plain
/// path component.
fn validate_name(kind: &str, name: &str) -> FbmResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(FbmError::InvalidManifest(format!(
            "invalid {} name '{}'",
            kind, name
        )));
    }
    Ok(())
}
