//! Directory pruning rules.

use std::collections::BTreeSet;

use globset::{Glob, GlobSet, GlobSetBuilder};

use strata_core::{ScanConfig, ScanError};

/// Prefix marking hidden entries.
const HIDDEN_PREFIX: char = '.';

/// Decides which directories the walker descends into.
///
/// Built once from a [`ScanConfig`]; `should_descend` is a pure function of
/// the configuration and the directory name.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exact: BTreeSet<String>,
    patterns: GlobSet,
    kept: BTreeSet<String>,
}

impl PathFilter {
    /// Build the filter from the effective ignore set of `config`.
    ///
    /// Entries containing glob metacharacters are compiled as patterns.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let mut exact = BTreeSet::new();
        let mut builder = GlobSetBuilder::new();

        for entry in config.effective_ignore_set() {
            if entry.contains(['*', '?', '[']) {
                let glob = Glob::new(&entry).map_err(|e| ScanError::InvalidConfig {
                    message: format!("bad ignore pattern {entry:?}: {e}"),
                })?;
                builder.add(glob);
            } else {
                exact.insert(entry);
            }
        }

        let patterns = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self {
            exact,
            patterns,
            kept: config.kept_set(),
        })
    }

    /// Whether a child directory named `dir_name` should be traversed.
    pub fn should_descend(&self, dir_name: &str) -> bool {
        if dir_name.starts_with(HIDDEN_PREFIX) {
            return false;
        }
        let lowered = dir_name.to_lowercase();
        if self.kept.contains(&lowered) {
            return true;
        }
        !(self.exact.contains(&lowered) || self.patterns.is_match(&lowered))
    }
}
