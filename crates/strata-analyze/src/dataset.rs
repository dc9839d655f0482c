//! Read-only query surface handed to reporting code.

use chrono::{DateTime, Local};
use serde::Serialize;

use strata_core::{FileRecord, TextEncoding};

use crate::aggregate::{
    HourTotal, MetadataAggregator, MonthlyPoint, TimeBucketDataset, WeekdayTotal, YearShare,
    YearTotal,
};

/// Headline numbers for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Unique files.
    pub total_files: u64,
    /// Sum of line counts.
    pub total_lines: u64,
    /// Sum of sizes in kibibytes.
    pub total_kb: f64,
    /// Earliest modification time.
    pub first_modified: Option<DateTime<Local>>,
    /// Latest modification time.
    pub last_modified: Option<DateTime<Local>>,
    /// Files whose lines were counted after the Latin-1 fallback.
    pub latin1_files: u64,
}

impl ReportSummary {
    fn from_records(records: &[FileRecord]) -> Self {
        Self {
            total_files: records.len() as u64,
            total_lines: records.iter().map(|r| r.line_count).sum(),
            total_kb: records.iter().map(|r| r.size_kb).sum(),
            first_modified: records.iter().map(|r| r.modified_at).min(),
            last_modified: records.iter().map(|r| r.modified_at).max(),
            latin1_files: records
                .iter()
                .filter(|r| r.encoding == TextEncoding::Latin1)
                .count() as u64,
        }
    }
}

/// Frozen records plus their calendar views.
///
/// Nothing here mutates after construction; every accessor is a pure read.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDataset {
    summary: ReportSummary,
    buckets: TimeBucketDataset,
    records: Vec<FileRecord>,
}

impl ReportDataset {
    /// Aggregate `records` and freeze them. Record order is preserved and
    /// breaks ties in the top-N queries.
    pub fn new(records: Vec<FileRecord>) -> Self {
        let buckets = MetadataAggregator::new().aggregate(&records);
        let summary = ReportSummary::from_records(&records);
        Self {
            summary,
            buckets,
            records,
        }
    }

    /// All records, in the order they were supplied.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Headline totals and period covered.
    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    /// Up to `n` records with the most lines, largest first.
    pub fn top_n_by_lines(&self, n: usize) -> Vec<&FileRecord> {
        let mut ranked: Vec<&FileRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| b.line_count.cmp(&a.line_count));
        ranked.truncate(n);
        ranked
    }

    /// Up to `n` records with the largest size, largest first.
    pub fn top_n_by_size(&self, n: usize) -> Vec<&FileRecord> {
        let mut ranked: Vec<&FileRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| b.size_kb.total_cmp(&a.size_kb));
        ranked.truncate(n);
        ranked
    }

    /// Lines per calendar year, oldest year first.
    pub fn annual_totals(&self) -> &[YearTotal] {
        &self.buckets.annual
    }

    /// Lines per weekday, Monday to Sunday, zeros included.
    pub fn weekday_totals(&self) -> &[WeekdayTotal] {
        &self.buckets.weekday
    }

    /// Lines per hour of day, 0 through 23.
    pub fn hourly_totals(&self) -> &[HourTotal] {
        &self.buckets.hourly
    }

    /// Monthly series with running totals; non-decreasing.
    pub fn cumulative_series(&self) -> &[MonthlyPoint] {
        &self.buckets.monthly
    }

    /// File count and percentage per year.
    pub fn yearly_file_share(&self) -> &[YearShare] {
        &self.buckets.yearly_share
    }
}
