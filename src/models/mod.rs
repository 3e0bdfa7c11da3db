//! Core data models for FBM
//!
//! The manifest shared by backup and restore, and the per-item outcome
//! records both engines aggregate into their results.

pub mod manifest;
pub mod outcome;

pub use manifest::{AppRecord, BenchManifest, FORMAT_VERSION};
pub use outcome::{ItemOutcome, ItemStatus, OutcomeTally};
