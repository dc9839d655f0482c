//! Per-file record types produced by a scan.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// BLAKE3 digest of a file's raw bytes, used as the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).ok_or_else(|| de::Error::custom("expected 64 hex characters"))
    }
}

/// Text decoding that produced a record's line count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    /// Content was valid UTF-8.
    Utf8,
    /// UTF-8 decoding failed; bytes were read as ISO-8859-1.
    Latin1,
}

/// One unique source file that survived deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path of the retained copy.
    pub path: PathBuf,

    /// Base file name.
    pub name: CompactString,

    /// Number of lines (newlines + 1, so never zero).
    pub line_count: u64,

    /// Size in kibibytes.
    pub size_kb: f64,

    /// Modification time in the local time zone.
    pub modified_at: DateTime<Local>,

    /// Digest of the raw bytes.
    pub content_hash: ContentHash,

    /// Decoding used for line counting.
    pub encoding: TextEncoding,
}

impl FileRecord {
    /// Size in whole bytes.
    pub fn size_bytes(&self) -> u64 {
        (self.size_kb * 1024.0).round() as u64
    }
}
