pub mod error;
pub mod lock;
pub mod store;
pub mod testing;

pub use error::StateError;
pub use lock::{DigestLock, LockGuard};
pub use store::{AnalysisStore, MetadataStore};
