//! Scan configuration types.

use std::collections::BTreeSet;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Name of strata's own output directory, part of the default ignore list.
pub const DEFAULT_OUTPUT_DIR: &str = "strata_output";

/// Directory names that carry no authored source: environments, build
/// output, vendored packages, editor and VCS metadata, caches.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "venv", ".venv", "env", ".env", "lib", "lib64", "site-packages", "dist-packages", "eggs",
    "pip-wheel-metadata", "__pycache__", "build", "dist", "docs", "doc", "etc", "static",
    "templates", "media", "node_modules", ".git", ".svn", ".hg", ".cvs", ".idea", ".vscode",
    ".spyder-py3", ".pylint.d", ".mypy_cache", ".pytest_cache", "__pypackages__", "wheelhouse",
    "htmlcov", ".coverage", "coverage.xml", "*.egg-info", "manifest", "sphinx-build", "_build",
    "_static", "_templates", "data", "resources", "assets", "out", "output", "target", "log",
    "logs", "tmp", "temp", "cache", "caches", ".gradle", ".mvn", ".docker", ".vagrant",
    ".terraform", ".ansible", ".terraform.lock.hcl", ".ds_store", ".trashes", "$recycle.bin",
    "system volume information", "._*", "._.trashes", "._.ds_store", ".localized",
    ".appledouble", DEFAULT_OUTPUT_DIR,
];

/// Directory names that are always descended into, whatever the ignore list says.
pub const DEFAULT_KEPT_DIRS: &[&str] = &[
    "test", "tests", "testing", "integration-tests", "unit-tests", "functional-tests",
    "benchmark", "benchmarks", "example", "examples", "sample", "samples", "notebooks",
];

/// File extensions tracked when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["py"];

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to scan.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Tracked file extensions, without the leading dot. Matching is case-sensitive.
    #[builder(default = "default_extensions()")]
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Baseline directory names (or glob patterns) never descended into.
    #[builder(default = "default_ignored_dirs()")]
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Directory names removed from the ignore set.
    #[builder(default = "default_kept_dirs()")]
    #[serde(default = "default_kept_dirs")]
    pub kept_dirs: Vec<String>,

    /// Additional names to ignore on top of the baseline.
    #[builder(default)]
    #[serde(default)]
    pub extra_ignore: Vec<String>,

    /// Number of threads for walking and hashing (0 = auto-detect, 1 = serial).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_ignored_dirs() -> Vec<String> {
    DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect()
}

fn default_kept_dirs() -> Vec<String> {
    DEFAULT_KEPT_DIRS.iter().map(|s| s.to_string()).collect()
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref extensions) = self.extensions {
            if extensions.is_empty() {
                return Err("At least one extension is required".to_string());
            }
            if extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
                return Err("Extensions cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a default config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: default_extensions(),
            ignored_dirs: default_ignored_dirs(),
            kept_dirs: default_kept_dirs(),
            extra_ignore: Vec::new(),
            threads: 0,
        }
    }

    /// Check whether a file name ends in one of the tracked extensions.
    pub fn is_tracked_file(&self, file_name: &str) -> bool {
        self.extensions.iter().any(|ext| {
            let ext = ext.trim_start_matches('.');
            file_name
                .strip_suffix(ext)
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }

    /// Effective ignore set: baseline plus extras, minus kept names, all lowercased.
    pub fn effective_ignore_set(&self) -> BTreeSet<String> {
        let kept: BTreeSet<String> = self.kept_dirs.iter().map(|d| d.to_lowercase()).collect();
        self.ignored_dirs
            .iter()
            .chain(&self.extra_ignore)
            .map(|d| d.to_lowercase())
            .filter(|d| !kept.contains(d))
            .collect()
    }

    /// Lowercased always-keep names.
    pub fn kept_set(&self) -> BTreeSet<String> {
        self.kept_dirs.iter().map(|d| d.to_lowercase()).collect()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(default_root())
    }
}
