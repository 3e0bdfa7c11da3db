//! On-disk helpers shared by the engines
//!
//! - `file_io`: atomic JSON writes and tolerant JSON reads

pub mod file_io;

pub use file_io::{partial_path, read_json, read_json_required, write_json_atomic};
