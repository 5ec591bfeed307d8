use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use depot_analysis::AnalysisError;
use depot_core::ErrorResponse;
use depot_files::FileError;

/// Errors that can occur when running the depot services.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The multipart upload body was malformed or missing the file part.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// A file storage error surfaced through the API.
    #[error(transparent)]
    File(#[from] FileError),

    /// An analysis error surfaced through the API.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// An upstream service could not be reached from the gateway.
    #[error("upstream unavailable: {0}")]
    Upstream(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::File(e) => match e {
                FileError::EmptyContent | FileError::EmptyName => StatusCode::BAD_REQUEST,
                FileError::NotFound(_) => StatusCode::NOT_FOUND,
                FileError::Io(_) | FileError::Blob(_) | FileError::State(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Analysis(e) => match e {
                AnalysisError::SourceNotFound(_) => StatusCode::NOT_FOUND,
                AnalysisError::UnreadableContent(_) => StatusCode::BAD_REQUEST,
                AnalysisError::Conflict(_) => StatusCode::CONFLICT,
                AnalysisError::Fetch { .. } => StatusCode::BAD_GATEWAY,
                AnalysisError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
