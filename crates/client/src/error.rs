//! Error types for the depot clients.

use thiserror::Error;

/// Errors that can occur when using the depot HTTP clients.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection error (network failure, DNS resolution, timeout).
    #[error("connection error: {0}")]
    Connection(String),

    /// Non-success HTTP status returned by the service.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message, taken from the response body when available.
        message: String,
    },

    /// A mandatory response header was absent.
    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),

    /// A response header carried an unparseable value.
    #[error("invalid {header} header: {message}")]
    InvalidHeader {
        /// Header name.
        header: &'static str,
        /// What was wrong with the value.
        message: String,
    },

    /// Response body deserialization error.
    #[error("failed to deserialize response: {0}")]
    Deserialization(String),

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Returns `true` if retrying the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the service answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_retryable() {
        assert!(Error::Connection("timeout".into()).is_retryable());
    }

    #[test]
    fn http_5xx_is_retryable_4xx_is_not() {
        let server_side = Error::Http {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(server_side.is_retryable());

        let client_side = Error::Http {
            status: 400,
            message: "bad request".into(),
        };
        assert!(!client_side.is_retryable());
    }

    #[test]
    fn not_found_is_distinguishable() {
        let err = Error::Http {
            status: 404,
            message: "no such file".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn header_errors_are_not_retryable() {
        assert!(!Error::MissingHeader("X-File-Hash").is_retryable());
    }
}
