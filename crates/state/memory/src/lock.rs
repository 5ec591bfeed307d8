use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use depot_core::FileHash;
use depot_state::error::StateError;
use depot_state::lock::{DigestLock, LockGuard};

/// In-process per-digest lock backed by a map of [`tokio::sync::Mutex`]es.
///
/// Sufficient for a single-instance deployment; a multi-instance deployment
/// relies on the metadata store's unique-hash constraint instead.
#[derive(Debug, Default)]
pub struct MemoryDigestLock {
    locks: DashMap<FileHash, Arc<Mutex<()>>>,
}

struct MemoryLockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl LockGuard for MemoryLockGuard {}

impl MemoryDigestLock {
    /// Create a new lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DigestLock for MemoryDigestLock {
    async fn acquire(&self, digest: &FileHash) -> Result<Box<dyn LockGuard>, StateError> {
        let mutex = self
            .locks
            .entry(digest.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        Ok(Box::new(MemoryLockGuard { _guard: guard }))
    }
}
