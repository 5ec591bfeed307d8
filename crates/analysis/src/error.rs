use thiserror::Error;

use depot_core::FileId;
use depot_state::StateError;

use crate::fetch::FetchError;

/// Errors from the analysis service.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The storage service has no file under this id.
    #[error("cannot analyze {0}: source file not found")]
    SourceNotFound(FileId),

    /// Fetching the file failed for a reason other than not-found.
    #[error("cannot analyze {id}: {source}")]
    Fetch {
        id: FileId,
        #[source]
        source: FetchError,
    },

    /// The content is not decodable as UTF-8 text.
    #[error("cannot analyze {0}: content is not readable as UTF-8 text")]
    UnreadableContent(FileId),

    /// A concurrent analyze inserted first and its record could not be
    /// re-read. Callers should retry; the cache-hit path will serve them.
    #[error("analysis of {0} raced with another request, retry")]
    Conflict(FileId),

    /// The analysis cache failed.
    #[error(transparent)]
    State(#[from] StateError),
}

impl AnalysisError {
    /// Fold a fetch failure into the analysis error taxonomy, keeping
    /// not-found distinguishable.
    #[must_use]
    pub fn from_fetch(id: FileId, source: FetchError) -> Self {
        match source {
            FetchError::NotFound(_) => Self::SourceNotFound(id),
            other => Self::Fetch { id, source: other },
        }
    }
}
