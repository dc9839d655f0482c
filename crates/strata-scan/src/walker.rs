//! Lazy candidate enumeration on top of jwalk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jwalk::{DirEntry, Parallelism, WalkDir};
use tracing::{debug, trace};

use strata_core::{InvalidRootReason, ScanConfig, ScanError, ScanWarning, WarningKind};

use crate::filter::PathFilter;

/// A tracked, non-empty regular file found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Size in bytes at listing time.
    pub size: u64,
}

/// Counters describing what a walk skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories removed by the path filter (their subtrees were never read).
    pub dirs_pruned: u64,
    /// Tracked files skipped because they were empty.
    pub zero_size_skipped: u64,
    /// Candidates yielded.
    pub candidates: u64,
}

/// Recursive walker that prunes ignored directories before descending.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    root: PathBuf,
    config: Arc<ScanConfig>,
    filter: Arc<PathFilter>,
}

impl DirectoryWalker {
    /// Validate the root and prepare a walker.
    ///
    /// Fails with [`ScanError::InvalidRoot`] when the root is missing or is
    /// not a directory; no traversal happens in that case.
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::invalid_root(&config.root, e))?;

        if !root.is_dir() {
            return Err(ScanError::InvalidRoot {
                path: root,
                reason: InvalidRootReason::NotADirectory,
            });
        }

        let filter = PathFilter::from_config(config)?;

        Ok(Self {
            root,
            config: Arc::new(config.clone()),
            filter: Arc::new(filter),
        })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a traversal. The returned iterator is lazy and single-use.
    pub fn walk(&self) -> Walk {
        let parallelism = match self.config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            1 => Parallelism::Serial,
            n => Parallelism::RayonNewPool(n),
        };

        let pruned = Arc::new(AtomicU64::new(0));
        let filter = Arc::clone(&self.filter);
        let pruned_counter = Arc::clone(&pruned);

        let walker = WalkDir::new(&self.root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .process_read_dir(move |depth, _dir, _state, children| {
                // The root arrives as the only child of a depth-less read; never filter it.
                if depth.is_none() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) if entry.file_type().is_dir() => {
                        let keep = filter.should_descend(&entry.file_name().to_string_lossy());
                        if !keep {
                            pruned_counter.fetch_add(1, Ordering::Relaxed);
                            trace!(path = %entry.path().display(), "pruned directory");
                        }
                        keep
                    }
                    _ => true,
                });
            });

        Walk {
            entries: Box::new(walker.into_iter()),
            config: Arc::clone(&self.config),
            pruned,
            zero_size_skipped: 0,
            candidates: 0,
        }
    }
}

/// Iterator over candidates of one traversal.
///
/// Directory listing failures surface as `Err(ScanWarning)` items; the walk
/// continues past them.
pub struct Walk {
    entries: Box<dyn Iterator<Item = Result<DirEntry<((), ())>, jwalk::Error>>>,
    config: Arc<ScanConfig>,
    pruned: Arc<AtomicU64>,
    zero_size_skipped: u64,
    candidates: u64,
}

impl Walk {
    /// Counters so far. Final once the iterator is exhausted.
    pub fn stats(&self) -> WalkStats {
        WalkStats {
            dirs_pruned: self.pruned.load(Ordering::Relaxed),
            zero_size_skipped: self.zero_size_skipped,
            candidates: self.candidates,
        }
    }
}

impl Iterator for Walk {
    type Item = Result<CandidateFile, ScanWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    return Some(Err(ScanWarning::new(
                        path,
                        err.to_string(),
                        WarningKind::WalkError,
                    )));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            if !self.config.is_tracked_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let path = entry.path();
            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    return Some(Err(ScanWarning::new(
                        path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    )));
                }
            };

            if size == 0 {
                self.zero_size_skipped += 1;
                debug!(path = %path.display(), "skipping empty file");
                continue;
            }

            self.candidates += 1;
            return Some(Ok(CandidateFile { path, size }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();

        fs::write(root.join("top.py"), "a = 1\n").unwrap();
        fs::write(root.join("pkg/mod.py"), "b = 2\n").unwrap();
        fs::write(root.join("pkg/sub/deep.py"), "c = 3\n").unwrap();
        fs::write(root.join("pkg/readme.md"), "# not python\n").unwrap();
        fs::write(root.join("pkg/empty.py"), "").unwrap();
        fs::write(root.join("node_modules/dep/vendored.py"), "d = 4\n").unwrap();
        fs::write(root.join(".hidden/secret.py"), "e = 5\n").unwrap();
        fs::write(root.join("tests/test_top.py"), "f = 6\n").unwrap();

        temp
    }

    fn names(walk: Walk) -> Vec<String> {
        let mut names: Vec<String> = walk
            .filter_map(Result::ok)
            .map(|c| c.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_walk_yields_tracked_files() {
        let temp = create_test_tree();
        let walker = DirectoryWalker::new(&ScanConfig::new(temp.path())).unwrap();

        assert_eq!(
            names(walker.walk()),
            vec!["deep.py", "mod.py", "test_top.py", "top.py"]
        );
    }

    #[test]
    fn test_walk_stats() {
        let temp = create_test_tree();
        let walker = DirectoryWalker::new(&ScanConfig::new(temp.path())).unwrap();

        let mut walk = walker.walk();
        let count = walk.by_ref().filter(Result::is_ok).count();
        let stats = walk.stats();

        assert_eq!(count, 4);
        assert_eq!(stats.candidates, 4);
        assert_eq!(stats.zero_size_skipped, 1);
        assert_eq!(stats.dirs_pruned, 2);
    }

    #[test]
    fn test_serial_walk_matches_parallel() {
        let temp = create_test_tree();
        let mut config = ScanConfig::new(temp.path());
        config.threads = 1;
        let serial = names(DirectoryWalker::new(&config).unwrap().walk());

        config.threads = 0;
        let parallel = names(DirectoryWalker::new(&config).unwrap().walk());

        let expected = vec!["deep.py", "mod.py", "test_top.py", "top.py"];
        assert_eq!(serial, expected);
        assert_eq!(parallel, expected);
    }

    #[test]
    fn test_root_named_like_ignored_dir_is_walked() {
        let temp = TempDir::new().unwrap();
        for name in ["lib", "build", ".proj"] {
            let root = temp.path().join(name);
            fs::create_dir_all(root.join("node_modules")).unwrap();
            fs::write(root.join("app.py"), "run()\n").unwrap();
            fs::write(root.join("node_modules/dep.py"), "dep()\n").unwrap();

            let walker = DirectoryWalker::new(&ScanConfig::new(&root)).unwrap();
            let mut walk = walker.walk();
            let found: Vec<CandidateFile> = walk.by_ref().filter_map(Result::ok).collect();

            assert_eq!(found.len(), 1, "root {name}");
            assert!(found[0].path.ends_with("app.py"));
            assert_eq!(walk.stats().dirs_pruned, 1, "root {name}");
        }
    }

    #[test]
    fn test_candidate_paths_are_absolute() {
        let temp = create_test_tree();
        let walker = DirectoryWalker::new(&ScanConfig::new(temp.path())).unwrap();
        assert!(walker.root().is_absolute());
        for candidate in walker.walk().filter_map(Result::ok) {
            assert!(candidate.path.is_absolute());
            assert!(candidate.size > 0);
        }
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = DirectoryWalker::new(&ScanConfig::new(temp.path().join("nope")));
        assert!(matches!(
            result,
            Err(ScanError::InvalidRoot {
                reason: InvalidRootReason::NotFound,
                ..
            })
        ));
    }

    #[test]
    fn test_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("single.py");
        fs::write(&file, "x\n").unwrap();

        let result = DirectoryWalker::new(&ScanConfig::new(&file));
        assert!(matches!(
            result,
            Err(ScanError::InvalidRoot {
                reason: InvalidRootReason::NotADirectory,
                ..
            })
        ));
    }
}
