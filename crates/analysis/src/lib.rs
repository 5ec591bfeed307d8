//! File analysis service: retrieve a stored file once, compute text
//! statistics, and cache the result.

pub mod error;
pub mod fetch;
pub mod service;

pub use error::AnalysisError;
pub use fetch::{FetchError, FetchedFile, FileFetcher};
pub use service::AnalysisService;
