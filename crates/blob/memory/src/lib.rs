//! In-memory [`BlobStore`] backed by a [`DashMap`], for tests and
//! single-process deployments.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use depot_blob::{BlobError, BlobStore};
use depot_core::BlobLocator;

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<BlobLocator, Bytes>,
}

impl MemoryBlobStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` when no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, locator: &BlobLocator, data: Bytes) -> Result<(), BlobError> {
        match self.blobs.entry(locator.clone()) {
            Entry::Occupied(_) => Err(BlobError::AlreadyExists(locator.to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(data);
                Ok(())
            }
        }
    }

    async fn get(&self, locator: &BlobLocator) -> Result<Option<Bytes>, BlobError> {
        Ok(self.blobs.get(locator).map(|entry| entry.clone()))
    }
}
