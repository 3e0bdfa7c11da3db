//! Archive and manifest formatting
//!
//! Formats archive listings and manifest details for terminal output.

use chrono::{DateTime, Utc};

use crate::backup::ArchiveInfo;
use crate::models::BenchManifest;

/// Format a list of archives as a table
pub fn format_archive_list(archives: &[ArchiveInfo], now: DateTime<Utc>) -> String {
    if archives.is_empty() {
        return "No backups found.".to_string();
    }

    let name_width = archives
        .iter()
        .map(|a| a.filename.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<12}  {:>10}  {:>6}\n",
        "File",
        "Bench",
        "Size",
        "Age",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<12}  {:->10}  {:->6}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for archive in archives {
        output.push_str(&format!(
            "{:<name_width$}  {:<12}  {:>10}  {:>6}\n",
            archive.filename,
            archive.bench_name,
            format_size(archive.size_bytes),
            format_duration(now.signed_duration_since(archive.created_at)),
            name_width = name_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} backup(s)\n", archives.len()));
    output
}

/// Format the contents of a manifest
pub fn format_manifest(manifest: &BenchManifest) -> String {
    let mut output = String::new();
    output.push_str(&format!("Bench:          {}\n", manifest.name));
    output.push_str(&format!(
        "Created:        {}\n",
        manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Format version: {}\n", manifest.format_version));

    output.push_str(&format!("\nApps ({}):\n", manifest.apps.len()));
    for app in &manifest.apps {
        output.push_str(&format!("  {}\n", app));
        if let Some(remote) = &app.git_remote {
            output.push_str(&format!("    remote: {}\n", remote));
        }
    }

    output.push_str(&format!("\nSites ({}):\n", manifest.sites.len()));
    for site in &manifest.sites {
        output.push_str(&format!("  {}\n", site));
    }
    output
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

/// Format a file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
