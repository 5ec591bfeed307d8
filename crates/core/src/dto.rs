use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::FileAnalysis;
use crate::hash::FileHash;
use crate::id::FileId;
use crate::metadata::FileMetadata;

/// Response header carrying the content digest on downloads.
pub const X_FILE_HASH: &str = "X-File-Hash";

/// Response header carrying the upload time (RFC 3339 UTC) on downloads.
pub const X_FILE_UPLOAD_TIME: &str = "X-File-UploadTime";

/// Body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: FileId,
    pub hash: FileHash,
    pub upload_time: DateTime<Utc>,
    pub name: String,
    /// `true` when the content was already stored; the returned fields are
    /// those of the original upload, not this request's.
    pub is_duplicate: bool,
}

impl UploadResponse {
    /// Build a response from stored metadata and the duplicate flag.
    #[must_use]
    pub fn from_metadata(metadata: &FileMetadata, is_duplicate: bool) -> Self {
        Self {
            id: metadata.id,
            hash: metadata.hash.clone(),
            upload_time: metadata.upload_time,
            name: metadata.name.clone(),
            is_duplicate,
        }
    }
}

/// Body of a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub id: FileId,
    pub word_count: u64,
    pub paragraph_count: u64,
    pub char_count: u64,
    pub upload_time: DateTime<Utc>,
    pub hash: FileHash,
}

impl From<FileAnalysis> for AnalysisResponse {
    fn from(analysis: FileAnalysis) -> Self {
        Self {
            id: analysis.id,
            word_count: analysis.word_count,
            paragraph_count: analysis.paragraph_count,
            char_count: analysis.char_count,
            upload_time: analysis.upload_time,
            hash: analysis.hash,
        }
    }
}

/// Structured problem body returned for every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short human-readable description of what went wrong.
    pub error: String,
}
