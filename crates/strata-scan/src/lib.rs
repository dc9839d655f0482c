//! Source file discovery and content deduplication for strata.
//!
//! # Overview
//!
//! `strata-scan` turns a directory into a set of unique source-file records:
//!
//! - **Pruned traversal** via jwalk; ignored and hidden directories are
//!   dropped before they are read
//! - **Content fingerprints** with BLAKE3 and newline-based line counts
//! - **Dedup** keyed by content, keeping the earliest-modified copy
//! - **Parallel hashing** on a rayon pool while the walk continues
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_scan::{ScanConfig, Scanner};
//!
//! let config = ScanConfig::new("/path/to/projects");
//! let outcome = Scanner::new().scan(&config).unwrap();
//!
//! println!("{} unique files", outcome.records.len());
//! println!("{} duplicates skipped", outcome.stats.duplicates_discarded);
//! ```

mod dedup;
mod filter;
mod hasher;
mod progress;
mod scanner;
mod walker;

pub use dedup::{DedupIndex, Observation};
pub use filter::PathFilter;
pub use hasher::{ContentHasher, Fingerprint};
pub use progress::ScanProgress;
pub use scanner::{ScanOutcome, ScanStats, Scanner};
pub use walker::{CandidateFile, DirectoryWalker, Walk, WalkStats};

// Re-export core types for convenience
pub use strata_core::{
    ContentHash, FileRecord, InvalidRootReason, ScanConfig, ScanError, ScanWarning, TextEncoding,
    WarningKind,
};
