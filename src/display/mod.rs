//! Display formatting for terminal output
//!
//! Provides utilities for formatting outcomes, archive listings and manifests.

pub mod archive;
pub mod outcome;

pub use archive::{format_archive_list, format_duration, format_manifest, format_size};
pub use outcome::format_outcomes;
