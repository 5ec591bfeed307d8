use thiserror::Error;

/// Errors from blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// A blob already exists under this locator. Locators are written at
    /// most once.
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    /// The locator contains characters the backend refuses to store under
    /// (path separators and the like).
    #[error("invalid blob locator: {0}")]
    InvalidLocator(String),

    /// An I/O failure in the backing storage.
    #[error("blob storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("blob storage error: {0}")]
    Backend(String),
}
