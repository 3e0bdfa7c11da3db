//! Backup CLI commands
//!
//! Implements `fbm backup` and `fbm backup-all`.

use std::path::PathBuf;

use clap::Args;

use super::Completion;
use crate::backup::{BackupEngine, BackupOptions, BackupResult};
use crate::config::settings::Settings;
use crate::display::format_outcomes;
use crate::error::FbmResult;

/// Arguments for `fbm backup`
#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Path to the bench to back up
    pub bench_path: PathBuf,

    /// Output directory for the archive
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a plain tar instead of tar.gz
    #[arg(long)]
    pub no_compress: bool,

    /// Replace an existing archive with the same name
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for `fbm backup-all`
#[derive(Args, Debug)]
pub struct BackupAllArgs {
    /// Directory containing benches
    pub benches_dir: PathBuf,

    /// Back up only this bench
    #[arg(short, long)]
    pub bench: Option<String>,

    /// Output directory for the archives
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write plain tars instead of tar.gz
    #[arg(long)]
    pub no_compress: bool,
}

fn backup_options(settings: &Settings, no_compress: bool, overwrite: bool) -> BackupOptions {
    BackupOptions {
        compress: settings.compress && !no_compress,
        overwrite,
    }
}

/// Handle `fbm backup`
pub fn handle_backup_command(settings: &Settings, args: BackupArgs) -> FbmResult<Completion> {
    let output_dir = args
        .output
        .unwrap_or_else(|| settings.default_output_dir.clone());
    let options = backup_options(settings, args.no_compress, args.overwrite);

    println!("Backing up {}...", args.bench_path.display());
    let result = BackupEngine::new(settings).backup(&args.bench_path, &output_dir, &options)?;
    print_backup_result(&result);

    Ok(Completion::from_warnings(result.has_warnings()))
}

/// Handle `fbm backup-all`
pub fn handle_backup_all_command(
    settings: &Settings,
    args: BackupAllArgs,
) -> FbmResult<Completion> {
    let output_dir = args
        .output
        .unwrap_or_else(|| settings.default_output_dir.clone());
    let options = backup_options(settings, args.no_compress, false);

    let results = BackupEngine::new(settings).backup_benches(
        &args.benches_dir,
        args.bench.as_deref(),
        &output_dir,
        &options,
    )?;

    if results.is_empty() {
        println!("No valid benches found in {}", args.benches_dir.display());
        return Ok(Completion::WithWarnings);
    }

    let mut has_warnings = false;
    for bench in &results {
        println!("== {}", bench.bench);
        match &bench.result {
            Ok(result) => {
                print_backup_result(result);
                has_warnings |= result.has_warnings();
            }
            Err(e) => {
                println!("Failed: {}", e);
                has_warnings = true;
            }
        }
        println!();
    }

    Ok(Completion::from_warnings(has_warnings))
}

fn print_backup_result(result: &BackupResult) {
    println!("Archive: {}", result.archive_path.display());
    println!("Apps recorded: {}", result.manifest.apps.len());
    print!("{}", format_outcomes("Sites", &result.sites));
    println!("{}", result.summary());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_options_respect_settings() {
        let mut settings = Settings::default();
        assert!(backup_options(&settings, false, false).compress);
        assert!(!backup_options(&settings, true, false).compress);

        settings.compress = false;
        assert!(!backup_options(&settings, false, true).compress);
        assert!(backup_options(&settings, false, true).overwrite);
    }
}
