use async_trait::async_trait;

use depot_core::FileHash;

use crate::error::StateError;

/// A held per-digest lock. Released on drop.
pub trait LockGuard: Send + Sync {}

/// Per-digest mutual exclusion for the upload path.
///
/// The dedup check and the subsequent blob/metadata writes are not one
/// transaction; serializing uploads of the same digest makes exactly one
/// concurrent uploader see a fresh store. A single-instance deployment can
/// use the in-process implementation; multi-instance deployments rely on the
/// store's unique-hash constraint as the backstop and may use this trait for
/// contention reduction only.
#[async_trait]
pub trait DigestLock: std::fmt::Debug + Send + Sync {
    /// Acquire the lock for a digest, waiting until it is available.
    async fn acquire(&self, digest: &FileHash) -> Result<Box<dyn LockGuard>, StateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify object safety.
    fn _assert_dyn_lock_guard(_: &dyn LockGuard) {}
    fn _assert_dyn_digest_lock(_: &dyn DigestLock) {}
}
