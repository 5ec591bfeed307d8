use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from [`FileHash`] construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashParseError {
    /// The input was empty or all whitespace.
    #[error("hash must not be empty")]
    Empty,

    /// The input contained characters outside `[a-f0-9]` after normalization.
    #[error("hash must be a lowercase hexadecimal string, got {0:?}")]
    NotHex(String),
}

/// A content digest in lowercase hexadecimal form.
///
/// This is the deduplication key for stored files: identical bytes always
/// produce an identical `FileHash`, regardless of upload name or time.
/// Construction goes through [`FileHash::parse`] (which normalizes and
/// validates) or [`FileHash::from_digest`] (which hex-encodes raw SHA-256
/// output); there is no way to hold a malformed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileHash(String);

impl FileHash {
    /// Parse a hexadecimal digest string, trimming and lowercasing first.
    pub fn parse(input: &str) -> Result<Self, HashParseError> {
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(HashParseError::Empty);
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(HashParseError::NotHex(normalized));
        }
        Ok(Self(normalized))
    }

    /// Build a `FileHash` from a raw SHA-256 digest.
    #[must_use]
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// The normalized hexadecimal string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FileHash {
    type Error = HashParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FileHash> for String {
    fn from(hash: FileHash) -> Self {
        hash.0
    }
}
