use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use depot_core::{FileHash, FileId};

/// A file pulled from the storage service together with its provenance.
///
/// The hash and upload time are whatever the storage service declared; the
/// analysis side trusts them without re-hashing the content. This is an
/// explicit trust boundary, not a verified invariant.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub content: Bytes,
    pub hash: FileHash,
    pub upload_time: DateTime<Utc>,
}

/// Errors from fetching a file across the service boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The storage service does not know this id.
    #[error("storage service has no file {0}")]
    NotFound(FileId),

    /// The request never completed (connection refused, timeout, DNS).
    #[error("transport error fetching file {id}: {message}")]
    Transport { id: FileId, message: String },

    /// The storage service answered with an unexpected status.
    #[error("storage service returned status {status} for file {id}")]
    Status { id: FileId, status: u16 },

    /// A mandatory provenance field was absent or unparseable. Provenance
    /// travels with content; without it the fetch is rejected.
    #[error("invalid provenance for file {id}: {message}")]
    Provenance { id: FileId, message: String },

    /// Reading the response body failed.
    #[error("reading content of file {id} failed: {message}")]
    Body { id: FileId, message: String },
}

/// Outbound client seam for pulling a stored file and its provenance.
///
/// The production implementation lives in the HTTP client crate; tests use
/// counting doubles.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Fetch the file's bytes plus its declared hash and upload time.
    async fn fetch(&self, id: FileId) -> Result<FetchedFile, FetchError>;
}
