use thiserror::Error;

use depot_blob::BlobError;
use depot_core::FileId;
use depot_state::StateError;

/// Errors from the file storage service.
#[derive(Debug, Error)]
pub enum FileError {
    /// The upload carried no bytes. Rejected before any store access.
    #[error("cannot store an empty file")]
    EmptyContent,

    /// The upload carried no display name.
    #[error("file name must not be empty")]
    EmptyName,

    /// No file is stored under this id. Also covers the corruption case
    /// where metadata exists but the blob bytes are gone.
    #[error("file {0} not found")]
    NotFound(FileId),

    /// Reading the upload stream failed.
    #[error("reading upload content failed: {0}")]
    Io(#[from] std::io::Error),

    /// The blob store failed.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The metadata store failed.
    #[error(transparent)]
    State(#[from] StateError),
}
