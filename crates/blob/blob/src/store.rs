use async_trait::async_trait;
use bytes::Bytes;

use depot_core::BlobLocator;

use crate::error::BlobError;

/// Pluggable byte-content storage keyed by an opaque locator.
///
/// Distinct from the metadata store: blobs hold the file bytes and nothing
/// else. Deletion is deliberately absent; stored content is immutable and
/// kept forever.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a locator. The locator must be fresh; storing
    /// twice under the same locator is [`BlobError::AlreadyExists`].
    async fn put(&self, locator: &BlobLocator, data: Bytes) -> Result<(), BlobError>;

    /// Retrieve the bytes for a locator. Returns `None` if nothing is
    /// stored there.
    async fn get(&self, locator: &BlobLocator) -> Result<Option<Bytes>, BlobError>;
}
