//! Content fingerprinting and line counting.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use compact_str::CompactString;
use tracing::debug;

use strata_core::{ContentHash, FileRecord, ScanWarning, TextEncoding, WarningKind};

use crate::walker::CandidateFile;

/// Digest and line count of a byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    /// BLAKE3 digest of the bytes.
    pub hash: ContentHash,
    /// Newlines + 1.
    pub line_count: u64,
    /// Decoding that succeeded.
    pub encoding: TextEncoding,
}

/// Turns candidate files into [`FileRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }

    /// Fingerprint raw bytes.
    ///
    /// Decoding tries UTF-8 first and falls back to Latin-1, which accepts any
    /// byte, so this never fails.
    pub fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let hash = ContentHash::new(*blake3::hash(bytes).as_bytes());

        let (newlines, encoding) = match std::str::from_utf8(bytes) {
            Ok(text) => (text.matches('\n').count(), TextEncoding::Utf8),
            Err(_) => (
                bytes.iter().map(|&b| char::from(b)).filter(|&c| c == '\n').count(),
                TextEncoding::Latin1,
            ),
        };

        Fingerprint {
            hash,
            line_count: newlines as u64 + 1,
            encoding,
        }
    }

    /// Read a candidate and build its record.
    ///
    /// Any I/O failure becomes a warning; no record is produced with
    /// partial metadata.
    pub fn record(&self, candidate: &CandidateFile) -> Result<FileRecord, ScanWarning> {
        let path = candidate.path.as_path();
        let bytes = fs::read(path).map_err(|e| ScanWarning::read_error(path, &e))?;
        if bytes.is_empty() {
            return Err(ScanWarning::new(
                path,
                "File was emptied after listing",
                WarningKind::ReadError,
            ));
        }

        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| ScanWarning::metadata_error(path, &e))?;

        let fingerprint = self.fingerprint(&bytes);
        if fingerprint.encoding == TextEncoding::Latin1 {
            debug!(path = %path.display(), "not valid UTF-8, counted lines as Latin-1");
        }

        Ok(FileRecord {
            path: candidate.path.clone(),
            name: file_name(path),
            line_count: fingerprint.line_count,
            size_kb: bytes.len() as f64 / 1024.0,
            modified_at: DateTime::<Local>::from(modified),
            content_hash: fingerprint.hash,
            encoding: fingerprint.encoding,
        })
    }
}

fn file_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_line_count() {
        let hasher = ContentHasher::new();
        assert_eq!(hasher.fingerprint(b"x").line_count, 1);
        assert_eq!(hasher.fingerprint(b"a\nb").line_count, 2);
        assert_eq!(hasher.fingerprint(b"a\nb\n").line_count, 3);
    }

    #[test]
    fn test_latin1_fallback() {
        let hasher = ContentHasher::new();
        // 0xe9 alone is invalid UTF-8 but is 'é' in Latin-1
        let fp = hasher.fingerprint(b"caf\xe9\nbar\n");
        assert_eq!(fp.encoding, TextEncoding::Latin1);
        assert_eq!(fp.line_count, 3);

        let fp = hasher.fingerprint("café\n".as_bytes());
        assert_eq!(fp.encoding, TextEncoding::Utf8);
        assert_eq!(fp.line_count, 2);
    }

    #[test]
    fn test_hash_depends_on_content_only() {
        let hasher = ContentHasher::new();
        let a = hasher.fingerprint(b"print('hi')\n");
        let b = hasher.fingerprint(b"print('hi')\n");
        let c = hasher.fingerprint(b"print('bye')\n");
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn test_record_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mod.py");
        fs::write(&path, "import os\nprint(os.sep)\n").unwrap();

        let candidate = CandidateFile {
            path: path.clone(),
            size: 24,
        };
        let record = ContentHasher::new().record(&candidate).unwrap();

        assert_eq!(record.path, path);
        assert_eq!(record.name.as_str(), "mod.py");
        assert_eq!(record.line_count, 3);
        assert!((record.size_kb - 24.0 / 1024.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_missing_file_is_warning() {
        let temp = TempDir::new().unwrap();
        let candidate = CandidateFile {
            path: temp.path().join("vanished.py"),
            size: 10,
        };
        let warning = ContentHasher::new().record(&candidate).unwrap_err();
        assert_eq!(warning.kind, WarningKind::ReadError);
    }
}
