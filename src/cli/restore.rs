//! Restore CLI command
//!
//! Implements `fbm restore`.

use std::path::PathBuf;

use clap::Args;

use super::Completion;
use crate::backup::{RestoreEngine, RestoreOptions};
use crate::display::format_outcomes;
use crate::error::FbmResult;

/// Arguments for `fbm restore`
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup archive to restore
    pub backup_path: PathBuf,

    /// Bench root to restore into (created if absent)
    #[arg(short, long)]
    pub target_dir: PathBuf,

    /// Do not record (or clone) apps
    #[arg(long)]
    pub skip_apps: bool,

    /// Do not restore site data
    #[arg(long)]
    pub skip_sites: bool,

    /// Clone apps from their recorded remotes (best-effort)
    #[arg(long)]
    pub clone_apps: bool,

    /// Replace sites and the app record that already exist at the target
    #[arg(long)]
    pub overwrite: bool,
}

impl From<&RestoreArgs> for RestoreOptions {
    fn from(args: &RestoreArgs) -> Self {
        Self {
            target_dir: args.target_dir.clone(),
            skip_apps: args.skip_apps,
            skip_sites: args.skip_sites,
            overwrite: args.overwrite,
            clone_apps: args.clone_apps,
        }
    }
}

/// Handle `fbm restore`
pub fn handle_restore_command(args: RestoreArgs) -> FbmResult<Completion> {
    let options = RestoreOptions::from(&args);

    println!(
        "Restoring {} into {}...",
        args.backup_path.display(),
        args.target_dir.display()
    );
    let result = RestoreEngine::new().restore(&args.backup_path, &options)?;

    if result.target_had_bench && !args.overwrite {
        println!("Note: target already contained a bench; existing files were kept.");
    }
    print!("{}", format_outcomes("Apps", &result.apps));
    print!("{}", format_outcomes("Sites", &result.sites));
    println!("{}", result.summary());

    let completion = Completion::from_warnings(result.has_warnings());
    if completion == Completion::WithWarnings {
        println!("Completed with warnings.");
    }
    Ok(completion)
}
