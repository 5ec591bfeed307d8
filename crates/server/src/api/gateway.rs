use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use depot_core::FileId;

use super::GatewayState;
use crate::error::ServerError;

/// `POST /v1/upload` -- stream the multipart body through to the storage
/// service and relay its response verbatim.
pub async fn upload(
    State(state): State<GatewayState>,
    request: Request,
) -> Result<Response, ServerError> {
    let url = format!("{}/v1/files", state.storage_url);
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned();

    let mut upstream = state
        .http
        .post(&url)
        .body(reqwest::Body::wrap_stream(
            request.into_body().into_data_stream(),
        ));
    if let Some(content_type) = content_type {
        upstream = upstream.header(header::CONTENT_TYPE, content_type);
    }

    let response = upstream.send().await.map_err(|e| upstream_error("storage", &e))?;
    Ok(relay(response))
}

/// `GET /v1/file/{id}` -- stream a download through from the storage
/// service, provenance headers included.
pub async fn download(
    State(state): State<GatewayState>,
    Path(id): Path<FileId>,
) -> Result<Response, ServerError> {
    let url = format!("{}/v1/files/{id}", state.storage_url);
    let response = state
        .http
        .get(&url)
        .send()
        .await
        .map_err(|e| upstream_error("storage", &e))?;
    Ok(relay(response))
}

/// `POST /v1/analyze/{id}` -- forward to the analysis service and relay
/// its response.
pub async fn analyze(
    State(state): State<GatewayState>,
    Path(id): Path<FileId>,
) -> Result<Response, ServerError> {
    let url = format!("{}/v1/analysis/{id}", state.analysis_url);
    let response = state
        .http
        .post(&url)
        .send()
        .await
        .map_err(|e| upstream_error("analysis", &e))?;
    Ok(relay(response))
}

fn upstream_error(upstream: &str, err: &reqwest::Error) -> ServerError {
    warn!(upstream, error = %err, "gateway request to upstream failed");
    ServerError::Upstream(format!("{upstream} service unreachable: {err}"))
}

/// Copy the upstream status, headers, and body into a client response.
///
/// The body is streamed, not buffered. `transfer-encoding` is dropped
/// so the gateway's own transport computes framing for its hop.
fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = upstream.headers().clone();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    for (name, value) in &headers {
        if name == header::TRANSFER_ENCODING {
            continue;
        }
        response.headers_mut().append(name.clone(), value.clone());
    }
    response
}
