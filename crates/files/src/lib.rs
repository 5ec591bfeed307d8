//! File storage service: hash-based dedup over a metadata store and a blob
//! store.

pub mod error;
pub mod hash;
pub mod service;

pub use error::FileError;
pub use hash::compute_digest;
pub use service::{Download, FileService, UploadOutcome};
