//! Per-file summary records and the content hash used to invalidate them.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes `bytes`.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Parses a stored digest, accepting upper- or lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns a message if `s` is not 64 hex characters.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid content hash {s:?}: expected 64 hex characters"));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// A summarised source file.
///
/// Identity is the path; whether the summary is still valid is decided by
/// comparing content hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// Path of the summarised file.
    pub path: PathBuf,
    /// Model-written summary; empty until summarised.
    pub summary: String,
    /// Hash of the contents the summary describes.
    pub contents_hash: ContentHash,
}

impl FileSummary {
    /// Creates an unsummarised record, hashing `contents`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, contents: &str) -> Self {
        Self {
            path: path.into(),
            summary: String::new(),
            contents_hash: ContentHash::of(contents.as_bytes()),
        }
    }

    /// Sets the summary text, trimming surrounding whitespace.
    #[must_use]
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.trim().to_string();
        self
    }

    /// Returns `true` if this record still describes contents hashing to `hash`.
    #[must_use]
    pub fn is_current(&self, hash: &ContentHash) -> bool {
        self.contents_hash == *hash
    }

    /// The path this record is keyed by.
    #[must_use]
    pub fn key(&self) -> &Path {
        &self.path
    }
}
