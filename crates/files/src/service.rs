use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, SeekFrom};
use tracing::{debug, info, warn};

use depot_blob::BlobStore;
use depot_core::{BlobLocator, FileId, FileMetadata};
use depot_state::{DigestLock, MetadataStore, StateError};

use crate::error::FileError;
use crate::hash;

/// Result of an upload: the canonical metadata plus whether the content was
/// already stored.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// The stored record. For a duplicate this is the *original* upload's
    /// metadata: its id, time, and name, not this request's.
    pub metadata: FileMetadata,
    /// `true` when the content digest was already registered.
    pub duplicate: bool,
}

/// Result of a download: metadata plus the file bytes.
#[derive(Debug, Clone)]
pub struct Download {
    pub metadata: FileMetadata,
    pub content: Bytes,
}

/// Orchestrates upload (hash, dedup check, persist) and download (metadata
/// lookup, content read) over the metadata and blob stores.
pub struct FileService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    digest_lock: Arc<dyn DigestLock>,
}

impl FileService {
    /// Assemble the service from its backing stores and the per-digest lock.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        digest_lock: Arc<dyn DigestLock>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            digest_lock,
        }
    }

    /// Store an uploaded file, deduplicating by content digest.
    ///
    /// The reader must be rewindable: the digest pass reads it to the end
    /// and restores the position, and a fresh store re-reads it from the
    /// start for persistence. Uploads of already-stored content return the
    /// original record and discard both the incoming bytes and the new
    /// display name.
    ///
    /// Uploads of the same digest are serialized through the per-digest
    /// lock, so exactly one concurrent uploader of new content observes a
    /// fresh store. A metadata insert conflict (another instance won the
    /// race) degrades to the duplicate outcome.
    pub async fn upload<R>(&self, content: &mut R, name: &str) -> Result<UploadOutcome, FileError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(FileError::EmptyName);
        }

        let (digest, size) = hash::compute_digest(content).await?;
        if size == 0 {
            return Err(FileError::EmptyContent);
        }

        let _guard = self.digest_lock.acquire(&digest).await?;

        if let Some(existing) = self.metadata.find_by_hash(&digest).await? {
            debug!(id = %existing.id, hash = %digest, "duplicate upload");
            return Ok(UploadOutcome {
                metadata: existing,
                duplicate: true,
            });
        }

        content.seek(SeekFrom::Start(0)).await?;
        let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        content.read_to_end(&mut data).await?;

        let id = FileId::random();
        let upload_time = Utc::now();
        let locator = derive_locator(id, name);

        // Blob first, metadata second: a blob write failure must never
        // leave an orphaned metadata record.
        self.blobs.put(&locator, Bytes::from(data)).await?;

        let metadata = FileMetadata {
            id,
            hash: digest.clone(),
            upload_time,
            name: name.to_owned(),
            locator,
        };

        match self.metadata.insert(&metadata).await {
            Ok(()) => {
                info!(id = %id, hash = %digest, size, "stored new file");
                Ok(UploadOutcome {
                    metadata,
                    duplicate: false,
                })
            }
            Err(StateError::Conflict(_)) => {
                // Another writer registered this digest between our check
                // and insert. Their record is canonical; ours becomes the
                // duplicate outcome. The just-written blob is unreferenced
                // and harmless.
                let existing = self
                    .metadata
                    .find_by_hash(&digest)
                    .await?
                    .ok_or_else(|| {
                        StateError::Backend(format!(
                            "insert of hash {digest} conflicted but no record is readable"
                        ))
                    })?;
                debug!(id = %existing.id, hash = %digest, "lost insert race, reporting duplicate");
                Ok(UploadOutcome {
                    metadata: existing,
                    duplicate: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a stored file's metadata and bytes by id.
    ///
    /// Metadata without blob bytes is a corruption condition surfaced
    /// identically to an id that never existed.
    pub async fn download(&self, id: FileId) -> Result<Download, FileError> {
        let metadata = self
            .metadata
            .get(id)
            .await?
            .ok_or(FileError::NotFound(id))?;

        match self.blobs.get(&metadata.locator).await? {
            Some(content) => Ok(Download { metadata, content }),
            None => {
                warn!(id = %id, locator = %metadata.locator, "metadata present but blob missing");
                Err(FileError::NotFound(id))
            }
        }
    }
}

/// Derive the blob locator for a fresh store from the minted id and the
/// display name, keeping only filesystem-safe characters from the name.
fn derive_locator(id: FileId, name: &str) -> BlobLocator {
    let safe: String = name
        .chars()
        .take(64)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    BlobLocator::new(format!("{id}-{safe}"))
}
