use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::FileHash;
use crate::id::FileId;

/// Opaque reference to where a file's bytes live in the blob store.
///
/// The storage service derives locators; blob backends treat them as plain
/// keys and must not interpret them beyond rejecting path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobLocator(String);

impl BlobLocator {
    /// Wrap an already-derived locator string.
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator as a plain key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata for a stored file, created exactly once per distinct content
/// digest and never mutated afterwards.
///
/// The display name is the one from the upload that first persisted this
/// content; later duplicate uploads do not change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Unique identifier, minted at first successful store.
    pub id: FileId,
    /// SHA-256 digest of the content, the dedup key.
    pub hash: FileHash,
    /// UTC timestamp of the first successful store.
    pub upload_time: DateTime<Utc>,
    /// Display name from the first upload.
    pub name: String,
    /// Where the bytes live in the blob store.
    pub locator: BlobLocator,
}
