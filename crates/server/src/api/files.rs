use std::io::Cursor;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use depot_core::{FileId, UploadResponse, X_FILE_HASH, X_FILE_UPLOAD_TIME};

use super::StorageState;
use crate::error::ServerError;

/// `POST /v1/files` -- store a file uploaded as the multipart `file` part.
///
/// Re-uploads of byte-identical content return the original record with
/// `isDuplicate` set; the new name and bytes are discarded.
pub async fn upload(
    State(state): State<StorageState>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidUpload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_owned();
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::InvalidUpload(e.to_string()))?;

        let mut content = Cursor::new(data);
        let outcome = state.files.upload(&mut content, &name).await?;
        let body = UploadResponse::from_metadata(&outcome.metadata, outcome.duplicate);
        return Ok((StatusCode::OK, Json(body)).into_response());
    }

    Err(ServerError::InvalidUpload(
        "multipart body is missing the 'file' part".to_owned(),
    ))
}

/// `GET /v1/files/{id}` -- download stored bytes.
///
/// Provenance travels in the `X-File-Hash` and `X-File-UploadTime`
/// response headers; the body is the raw content served as `text/plain`.
pub async fn download(
    State(state): State<StorageState>,
    Path(id): Path<FileId>,
) -> Result<Response, ServerError> {
    let download = state.files.download(id).await?;
    let headers = [
        (
            header::CONTENT_TYPE.as_str(),
            "text/plain; charset=utf-8".to_owned(),
        ),
        (X_FILE_HASH, download.metadata.hash.to_string()),
        (
            X_FILE_UPLOAD_TIME,
            download.metadata.upload_time.to_rfc3339(),
        ),
    ];
    Ok((StatusCode::OK, headers, download.content).into_response())
}
