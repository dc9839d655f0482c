//! Time-bucket analysis for strata.
//!
//! This crate turns the deduplicated records produced by `strata-scan` into
//! read-only report data:
//!
//! - **Annual, weekday and hourly line totals** (weekday and hour buckets are
//!   always complete, zero-filled)
//! - **Cumulative monthly growth** of lines and files
//! - **Yearly file share** for proportional charts
//! - **Top-N lookups** by line count or size
//!
//! ```rust,ignore
//! use strata_analyze::ReportDataset;
//! use strata_scan::{ScanConfig, Scanner};
//!
//! let outcome = Scanner::new().scan(&ScanConfig::new("/path/to/projects"))?;
//! let dataset = ReportDataset::new(outcome.records);
//!
//! for point in dataset.cumulative_series() {
//!     println!("{}: {} lines", point.month, point.cumulative_lines);
//! }
//! ```

pub mod aggregate;
mod dataset;

pub use aggregate::{
    HourTotal, MetadataAggregator, MonthlyPoint, TimeBucketDataset, WEEKDAYS, WeekdayTotal,
    YearShare, YearTotal,
};
pub use dataset::{ReportDataset, ReportSummary};

// Re-export core types
pub use strata_core::{ContentHash, FileRecord};
