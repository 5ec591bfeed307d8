//! Core domain types for the depot pipeline.
//!
//! Everything here is pure data: identifiers, the content digest value type,
//! stored-file and analysis records, text statistics, and the wire DTOs
//! shared by the server and the client.

pub mod analysis;
pub mod dto;
pub mod hash;
pub mod id;
pub mod metadata;
pub mod stats;

pub use analysis::FileAnalysis;
pub use dto::{AnalysisResponse, ErrorResponse, UploadResponse, X_FILE_HASH, X_FILE_UPLOAD_TIME};
pub use hash::{FileHash, HashParseError};
pub use id::{FileId, FileIdParseError};
pub use metadata::{BlobLocator, FileMetadata};
pub use stats::TextStats;
