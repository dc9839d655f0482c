//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a root path was rejected before traversal.
#[derive(Debug, Error)]
pub enum InvalidRootReason {
    /// Nothing exists at the path.
    #[error("path does not exist")]
    NotFound,

    /// The path exists but is not a directory.
    #[error("not a directory")]
    NotADirectory,

    /// The path could not be resolved or inspected.
    #[error("{0}")]
    Io(#[source] std::io::Error),
}

/// Errors that end a scan. Everything else is a [`ScanWarning`].
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root does not exist or is not a directory; nothing was traversed.
    #[error("Invalid root directory {path}: {reason}")]
    InvalidRoot {
        path: PathBuf,
        #[source]
        reason: InvalidRootReason,
    },

    /// The walk finished without a single unique qualifying file.
    #[error("No qualifying files found under {root}")]
    NoQualifyingFiles { root: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an invalid-root error from a failed stat or canonicalize.
    pub fn invalid_root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let reason = match source.kind() {
            std::io::ErrorKind::NotFound => InvalidRootReason::NotFound,
            _ => InvalidRootReason::Io(source),
        };
        Self::InvalidRoot {
            path: path.into(),
            reason,
        }
    }

    /// Whether this is the empty-result condition rather than a failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::NoQualifyingFiles { .. })
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading file contents.
    ReadError,
    /// Error reading metadata (size or modification time).
    MetadataError,
    /// Error listing a directory during traversal.
    WalkError,
}

/// Non-fatal warning encountered during scan. The affected file is excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a read error warning, classifying permission failures.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::permission_denied(path);
        }
        Self::new(path, format!("Read error: {error}"), WarningKind::ReadError)
    }

    /// Create a metadata error warning.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(
            path,
            format!("Metadata error: {error}"),
            WarningKind::MetadataError,
        )
    }
}
