use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use depot_core::{AnalysisResponse, FileId};

use super::AnalysisState;
use crate::error::ServerError;

/// `POST /v1/analysis/{id}` -- compute (or serve cached) text statistics
/// for a stored file.
pub async fn analyze(
    State(state): State<AnalysisState>,
    Path(id): Path<FileId>,
) -> Result<Response, ServerError> {
    let analysis = state.analysis.analyze(id).await?;
    let body = AnalysisResponse::from(analysis);
    Ok((StatusCode::OK, Json(body)).into_response())
}
