//! Scan pipeline: walk, fingerprint, dedup.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use strata_core::{FileRecord, ScanConfig, ScanError, ScanWarning};

use crate::dedup::{DedupIndex, Observation};
use crate::hasher::ContentHasher;
use crate::progress::ScanProgress;
use crate::walker::{CandidateFile, DirectoryWalker};

/// Candidates between progress updates.
const PROGRESS_INTERVAL: u64 = 256;

/// Counters for a completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Directories skipped by the path filter.
    pub dirs_pruned: u64,
    /// Empty tracked files skipped.
    pub zero_size_skipped: u64,
    /// Candidates handed to the hasher.
    pub candidates: u64,
    /// Candidates dropped or displaced because their content was already held.
    pub duplicates_discarded: u64,
}

/// Result of a successful scan: at least one unique record.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    /// One record per unique content, ordered by modification time then path.
    pub records: Vec<FileRecord>,
    /// Files that were excluded because they could not be read.
    pub warnings: Vec<ScanWarning>,
    /// Walk and dedup counters.
    pub stats: ScanStats,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

/// Runs a full scan and reports progress on a broadcast channel.
pub struct Scanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl Scanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan `config.root`.
    ///
    /// Fails before traversal on an invalid root, and after traversal with
    /// [`ScanError::NoQualifyingFiles`] when nothing survived. Per-file
    /// problems are returned as warnings in the outcome.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let walker = DirectoryWalker::new(config)?;
        info!(root = %walker.root().display(), extensions = ?config.extensions, "starting scan");

        let pipeline = Pipeline {
            hasher: ContentHasher::new(),
            index: DedupIndex::new(),
            warnings: Mutex::new(Vec::new()),
            processed: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            progress_tx: &self.progress_tx,
            start,
        };

        let mut walk = walker.walk();
        if config.threads == 1 {
            for item in walk.by_ref() {
                match item {
                    Ok(candidate) => pipeline.process(candidate),
                    Err(warning) => pipeline.warn(warning),
                }
            }
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("strata-hash-{i}"))
                .build()
                .map_err(|e| ScanError::InvalidConfig {
                    message: format!("cannot start worker pool: {e}"),
                })?;

            let pipeline = &pipeline;
            pool.in_place_scope(|scope| {
                for item in walk.by_ref() {
                    match item {
                        Ok(candidate) => scope.spawn(move |_| pipeline.process(candidate)),
                        Err(warning) => pipeline.warn(warning),
                    }
                }
            });
        }

        let walk_stats = walk.stats();
        let Pipeline {
            index,
            warnings,
            duplicates,
            ..
        } = pipeline;

        let warnings = warnings.into_inner().unwrap_or_else(PoisonError::into_inner);
        let records = index.finalize();
        let duration = start.elapsed();

        let stats = ScanStats {
            dirs_pruned: walk_stats.dirs_pruned,
            zero_size_skipped: walk_stats.zero_size_skipped,
            candidates: walk_stats.candidates,
            duplicates_discarded: duplicates.into_inner(),
        };

        let _ = self.progress_tx.send(ScanProgress {
            files_processed: stats.candidates,
            unique_files: records.len() as u64,
            duplicates: stats.duplicates_discarded,
            warnings_count: warnings.len() as u64,
            current_path: PathBuf::new(),
            elapsed: duration,
            finished: true,
        });

        info!(
            unique = records.len(),
            candidates = stats.candidates,
            duplicates = stats.duplicates_discarded,
            pruned = stats.dirs_pruned,
            warnings = warnings.len(),
            elapsed_ms = duration.as_millis() as u64,
            "scan complete"
        );

        if records.is_empty() {
            return Err(ScanError::NoQualifyingFiles {
                root: walker.root().to_path_buf(),
            });
        }

        Ok(ScanOutcome {
            root: walker.root().to_path_buf(),
            records,
            warnings,
            stats,
            duration,
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state for one scan; workers only hold `&Pipeline`.
struct Pipeline<'a> {
    hasher: ContentHasher,
    index: DedupIndex,
    warnings: Mutex<Vec<ScanWarning>>,
    processed: AtomicU64,
    duplicates: AtomicU64,
    progress_tx: &'a broadcast::Sender<ScanProgress>,
    start: Instant,
}

impl Pipeline<'_> {
    fn process(&self, candidate: CandidateFile) {
        match self.hasher.record(&candidate) {
            Ok(record) => match self.index.observe(record) {
                Observation::Inserted => {}
                Observation::Replaced | Observation::Kept => {
                    debug!(path = %candidate.path.display(), "duplicate content");
                    self.duplicates.fetch_add(1, Ordering::Relaxed);
                }
            },
            Err(warning) => self.warn(warning),
        }

        let count = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if count % PROGRESS_INTERVAL == 0 {
            let _ = self.progress_tx.send(ScanProgress {
                files_processed: count,
                unique_files: self.index.len() as u64,
                duplicates: self.duplicates.load(Ordering::Relaxed),
                warnings_count: self.warning_count(),
                current_path: candidate.path,
                elapsed: self.start.elapsed(),
                finished: false,
            });
        }
    }

    fn warn(&self, warning: ScanWarning) {
        warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }

    fn warning_count(&self) -> u64 {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len() as u64
    }
}
