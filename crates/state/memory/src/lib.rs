pub mod lock;
pub mod store;

pub use lock::MemoryDigestLock;
pub use store::{MemoryAnalysisStore, MemoryMetadataStore};
