use async_trait::async_trait;

use depot_core::{FileAnalysis, FileHash, FileId, FileMetadata};

use crate::error::StateError;

/// Durable mapping from file id (and, secondarily, content hash) to
/// stored-file metadata.
///
/// Records are created exactly once and never mutated or deleted, so the
/// trait is deliberately narrow: insert-once plus two lookups.
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait MetadataStore: std::fmt::Debug + Send + Sync {
    /// Register a new record. Both the id and the hash must be unique;
    /// a collision on either yields [`StateError::Conflict`] and leaves the
    /// existing record untouched.
    async fn insert(&self, metadata: &FileMetadata) -> Result<(), StateError>;

    /// Look up a record by id. Returns `None` if absent.
    async fn get(&self, id: FileId) -> Result<Option<FileMetadata>, StateError>;

    /// Look up a record by content hash (the dedup check).
    async fn find_by_hash(&self, hash: &FileHash) -> Result<Option<FileMetadata>, StateError>;
}

/// Durable cache of analysis results, one per file id.
#[async_trait]
pub trait AnalysisStore: std::fmt::Debug + Send + Sync {
    /// Persist a new result. A second insert for the same id yields
    /// [`StateError::Conflict`] and never overwrites the first.
    async fn insert(&self, analysis: &FileAnalysis) -> Result<(), StateError>;

    /// Look up a cached result by file id.
    async fn get(&self, id: FileId) -> Result<Option<FileAnalysis>, StateError>;
}
