use thiserror::Error;

/// Errors from metadata and analysis store operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// An insert collided with an existing record (same id or same hash).
    /// Callers should retry via the read path rather than treat this as
    /// fatal.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Could not reach the backend.
    #[error("connection error: {0}")]
    Connection(String),

    /// A stored value could not be decoded into a domain type.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StateError {
    /// Returns `true` for insert conflicts.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
