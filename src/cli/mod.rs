//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the clap
//! argument parsing with the backup and restore engines.

pub mod archive;
pub mod backup;
pub mod restore;

pub use archive::{handle_info_command, handle_list_command, InfoArgs, ListArgs};
pub use backup::{handle_backup_all_command, handle_backup_command, BackupAllArgs, BackupArgs};
pub use restore::{handle_restore_command, RestoreArgs};

/// How a command finished when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Everything attempted succeeded
    Clean,
    /// Done, but some site or app failed or collided
    WithWarnings,
}

impl Completion {
    pub fn from_warnings(has_warnings: bool) -> Self {
        if has_warnings {
            Self::WithWarnings
        } else {
            Self::Clean
        }
    }

    /// Process exit code: 0 clean, 2 completed with warnings
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::WithWarnings => 2,
        }
    }
}
