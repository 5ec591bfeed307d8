use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use depot_core::{FileAnalysis, FileHash, FileId, FileMetadata};
use depot_state::error::StateError;
use depot_state::store::{AnalysisStore, MetadataStore};

/// In-memory [`MetadataStore`] backed by two [`DashMap`]s: the primary
/// id-keyed map plus a hash-keyed index for the dedup lookup.
///
/// Hash uniqueness is enforced by claiming the hash index entry first; the
/// id entry is only written once the hash claim succeeds, so a losing racer
/// observes a [`StateError::Conflict`] and the winner's record is never
/// touched.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    by_id: DashMap<FileId, FileMetadata>,
    by_hash: DashMap<FileHash, FileId>,
}

impl MemoryMetadataStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, metadata: &FileMetadata) -> Result<(), StateError> {
        // Claim the hash slot first so two writers of the same content
        // cannot both proceed.
        match self.by_hash.entry(metadata.hash.clone()) {
            Entry::Occupied(_) => {
                return Err(StateError::Conflict(format!(
                    "hash {} is already registered",
                    metadata.hash
                )));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(metadata.id);
            }
        }

        match self.by_id.entry(metadata.id) {
            Entry::Occupied(_) => {
                // Roll back the hash claim; the id slot belongs to someone else.
                self.by_hash.remove(&metadata.hash);
                Err(StateError::Conflict(format!(
                    "file id {} is already registered",
                    metadata.id
                )))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(metadata.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: FileId) -> Result<Option<FileMetadata>, StateError> {
        Ok(self.by_id.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_hash(&self, hash: &FileHash) -> Result<Option<FileMetadata>, StateError> {
        let Some(id) = self.by_hash.get(hash).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|entry| entry.clone()))
    }
}

/// In-memory [`AnalysisStore`] backed by a [`DashMap`].
#[derive(Debug, Default)]
pub struct MemoryAnalysisStore {
    results: DashMap<FileId, FileAnalysis>,
}

impl MemoryAnalysisStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn insert(&self, analysis: &FileAnalysis) -> Result<(), StateError> {
        match self.results.entry(analysis.id) {
            Entry::Occupied(_) => Err(StateError::Conflict(format!(
                "analysis result for {} already exists",
                analysis.id
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(analysis.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: FileId) -> Result<Option<FileAnalysis>, StateError> {
        Ok(self.results.get(&id).map(|entry| entry.clone()))
    }
}
