//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Candidates read and fingerprinted so far.
    pub files_processed: u64,
    /// Unique contents held by the dedup index.
    pub unique_files: u64,
    /// Candidates dropped or displaced as duplicates.
    pub duplicates: u64,
    /// Warnings recorded so far.
    pub warnings_count: u64,
    /// Most recent file processed.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
    /// Set on the last update of a scan.
    pub finished: bool,
}

impl ScanProgress {
    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_processed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_per_second() {
        let mut progress = ScanProgress {
            files_processed: 0,
            unique_files: 0,
            duplicates: 0,
            warnings_count: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
            finished: false,
        };
        assert_eq!(progress.files_per_second(), 0.0);

        progress.files_processed = 50;
        progress.elapsed = Duration::from_secs(2);
        assert_eq!(progress.files_per_second(), 25.0);
    }
}
