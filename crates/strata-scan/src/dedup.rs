//! Content-keyed dedup index.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use strata_core::{ContentHash, FileRecord};

/// What `observe` did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First record with this content.
    Inserted,
    /// Replaced a later-modified copy of the same content.
    Replaced,
    /// An equal or earlier copy was already held; the record was dropped.
    Kept,
}

/// Keeps exactly one record per content hash: the earliest modified.
///
/// `observe` may be called from many threads. The compare-and-replace for a
/// key runs while holding that key's shard lock, so two near-simultaneous
/// observations of the same content cannot lose the earlier one.
#[derive(Debug, Default)]
pub struct DedupIndex {
    entries: DashMap<ContentHash, FileRecord>,
}

impl DedupIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Offer a record to the index.
    ///
    /// Replaces the held record only when `record` is strictly older, so on
    /// equal timestamps the first one observed wins.
    pub fn observe(&self, record: FileRecord) -> Observation {
        match self.entries.entry(record.content_hash) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                Observation::Inserted
            }
            Entry::Occupied(mut slot) => {
                if record.modified_at < slot.get().modified_at {
                    slot.insert(record);
                    Observation::Replaced
                } else {
                    Observation::Kept
                }
            }
        }
    }

    /// Number of unique contents held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the index into its records, ordered by modification time then path.
    pub fn finalize(self) -> Vec<FileRecord> {
        let mut records: Vec<FileRecord> = self.entries.into_iter().map(|(_, r)| r).collect();
        records.sort_by(|a, b| {
            a.modified_at
                .cmp(&b.modified_at)
                .then_with(|| a.path.cmp(&b.path))
        });
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::{Duration, Local, TimeZone};
    use rayon::prelude::*;
    use strata_core::TextEncoding;

    fn record(path: &str, hash: u8, day: i64) -> FileRecord {
        let base = Local.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap();
        FileRecord {
            path: PathBuf::from(path),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            line_count: 10,
            size_kb: 0.5,
            modified_at: base + Duration::days(day),
            content_hash: ContentHash::new([hash; 32]),
            encoding: TextEncoding::Utf8,
        }
    }

    #[test]
    fn test_keeps_earliest() {
        let index = DedupIndex::new();
        assert_eq!(index.observe(record("/b.py", 1, 5)), Observation::Inserted);
        assert_eq!(index.observe(record("/a.py", 1, 1)), Observation::Replaced);
        assert_eq!(index.observe(record("/c.py", 1, 3)), Observation::Kept);

        let records = index.finalize();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, PathBuf::from("/a.py"));
    }

    #[test]
    fn test_equal_timestamp_first_wins() {
        let index = DedupIndex::new();
        index.observe(record("/first.py", 7, 2));
        assert_eq!(index.observe(record("/second.py", 7, 2)), Observation::Kept);
        assert_eq!(index.finalize()[0].path, PathBuf::from("/first.py"));
    }

    #[test]
    fn test_distinct_contents_all_kept_in_time_order() {
        let index = DedupIndex::new();
        index.observe(record("/late.py", 1, 9));
        index.observe(record("/early.py", 2, 0));
        index.observe(record("/mid.py", 3, 4));
        assert_eq!(index.len(), 3);

        let paths: Vec<_> = index.finalize().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/early.py"),
                PathBuf::from("/mid.py"),
                PathBuf::from("/late.py")
            ]
        );
    }

    #[test]
    fn test_concurrent_observe_keeps_minimum() {
        let index = DedupIndex::new();
        (0..200i64).into_par_iter().for_each(|i| {
            let day = 200 - i;
            index.observe(record(&format!("/copy{i}.py"), (i % 4) as u8, day));
        });

        let records = index.finalize();
        assert_eq!(records.len(), 4);
        for r in &records {
            let hash = r.content_hash.0[0] as i64;
            // Largest i with i % 4 == hash has the smallest day.
            let expected_i = 196 + hash;
            assert_eq!(r.path, PathBuf::from(format!("/copy{expected_i}.py")));
        }
    }
}
