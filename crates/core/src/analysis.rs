use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::FileHash;
use crate::id::FileId;
use crate::stats::TextStats;

/// Cached text statistics for a stored file.
///
/// Keyed by the file id minted by the storage service; at most one record
/// exists per id. `upload_time` and `hash` are copied from the source file's
/// metadata as provenance, not recomputed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Identifier of the analyzed file.
    pub id: FileId,
    /// Maximal runs of non-whitespace characters.
    pub word_count: u64,
    /// Non-empty blank-line-separated segments.
    pub paragraph_count: u64,
    /// Characters in the decoded text.
    pub char_count: u64,
    /// Upload time copied from the source file's metadata.
    pub upload_time: DateTime<Utc>,
    /// Content digest copied from the source file's metadata.
    pub hash: FileHash,
}

impl FileAnalysis {
    /// Assemble a record from computed statistics and trusted provenance.
    #[must_use]
    pub fn new(
        id: FileId,
        stats: TextStats,
        upload_time: DateTime<Utc>,
        hash: FileHash,
    ) -> Self {
        Self {
            id,
            word_count: stats.words,
            paragraph_count: stats.paragraphs,
            char_count: stats.chars,
            upload_time,
            hash,
        }
    }
}
