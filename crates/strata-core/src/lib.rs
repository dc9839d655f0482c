//! Core types and configuration for strata.
//!
//! This crate provides the data structures shared by the scan and analysis
//! crates: the deduplicated file record, its content hash, scan
//! configuration, and the error/warning taxonomy.

mod config;
mod error;
mod record;

pub use config::{
    DEFAULT_EXTENSIONS, DEFAULT_IGNORED_DIRS, DEFAULT_KEPT_DIRS, DEFAULT_OUTPUT_DIR, ScanConfig,
    ScanConfigBuilder,
};
pub use error::{InvalidRootReason, ScanError, ScanWarning, WarningKind};
pub use record::{ContentHash, FileRecord, TextEncoding};
