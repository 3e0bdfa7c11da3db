//! Configuration module for FBM
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution for the settings file
//! - User settings persistence
//! - The fixed bench and archive layout names

pub mod layout;
pub mod paths;
pub mod settings;

pub use layout::BenchLayout;
pub use paths::FbmPaths;
pub use settings::Settings;
