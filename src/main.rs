use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fbm::cli::{
    handle_backup_all_command, handle_backup_command, handle_info_command, handle_list_command,
    handle_restore_command, BackupAllArgs, BackupArgs, Completion, InfoArgs, ListArgs,
    RestoreArgs,
};
use fbm::config::{paths::FbmPaths, settings::Settings};

#[derive(Parser)]
#[command(
    name = "fbm",
    version,
    about = "Backup and restore Frappe benches",
    long_about = "FBM (Frappe Bench Manager) backs up a bench's apps, their git state \
                  and every site's data into a single archive, and restores benches \
                  from such archives."
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FBM_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up a bench
    Backup(BackupArgs),

    /// Back up every bench in a directory
    BackupAll(BackupAllArgs),

    /// Restore a bench from a backup
    Restore(RestoreArgs),

    /// Show the manifest of a backup
    Info(InfoArgs),

    /// List backups in a directory
    List(ListArgs),

    /// Show current configuration and paths
    Config,
}

fn main() -> ExitCode {
    match run() {
        Ok(completion) => ExitCode::from(completion.exit_code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<Completion> {
    let cli = Cli::parse();

    let paths = FbmPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    fbm::logging::init(level)?;

    let completion = match cli.command {
        Commands::Backup(args) => handle_backup_command(&settings, args)?,
        Commands::BackupAll(args) => handle_backup_all_command(&settings, args)?,
        Commands::Restore(args) => handle_restore_command(args)?,
        Commands::Info(args) => handle_info_command(args)?,
        Commands::List(args) => handle_list_command(&settings, args)?,
        Commands::Config => {
            println!("FBM Configuration");
            println!("=================");
            println!("Settings file:      {}", paths.settings_file().display());
            println!("Output directory:   {}", settings.default_output_dir.display());
            println!("Compress:           {}", settings.compress);
            println!("Excluded site dirs: {}", settings.excluded_site_entries.join(", "));
            println!("Preferred remotes:  {}", settings.preferred_remotes.join(", "));
            println!("Log level:          {}", settings.log_level);
            Completion::Clean
        }
    };

    Ok(completion)
}
