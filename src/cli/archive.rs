//! Archive inspection CLI commands
//!
//! Implements `fbm info` and `fbm list`.

use std::path::PathBuf;

use clap::Args;

use super::Completion;
use crate::backup::{list_archives, RestoreEngine};
use crate::config::settings::Settings;
use crate::display::{format_archive_list, format_manifest, format_size};
use crate::error::FbmResult;

/// Arguments for `fbm info`
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Backup archive to describe
    pub backup_path: PathBuf,
}

/// Arguments for `fbm list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory holding archives (defaults to the configured output directory)
    pub dir: Option<PathBuf>,
}

/// Handle `fbm info`
pub fn handle_info_command(args: InfoArgs) -> FbmResult<Completion> {
    let manifest = RestoreEngine::new().read_manifest(&args.backup_path)?;
    let metadata = std::fs::metadata(&args.backup_path)?;

    println!("Backup Details");
    println!("==============");
    println!("File: {}", args.backup_path.display());
    println!("Size: {}", format_size(metadata.len()));
    print!("{}", format_manifest(&manifest));

    Ok(Completion::Clean)
}

/// Handle `fbm list`
pub fn handle_list_command(settings: &Settings, args: ListArgs) -> FbmResult<Completion> {
    let dir = args
        .dir
        .unwrap_or_else(|| settings.default_output_dir.clone());
    let archives = list_archives(&dir)?;

    print!("{}", format_archive_list(&archives, chrono::Utc::now()));
    if archives.is_empty() {
        println!();
        println!("Create one with: fbm backup <bench_path>");
    }
    Ok(Completion::Clean)
}
