use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/files/{filename}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Download a stored upload",
    description = "Streams a file from the upload directory with a content type guessed from \
        its extension.",
    params(("filename" = String, Path, description = "Stored filename")),
    responses(
        (status = 200, description = "File contents"),
        (status = 400, description = "Invalid filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let path = state.file_store.path(&filename)?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("File '{filename}' not found")));
        }
        Err(e) => return Err(AppError::Internal(format!("Failed to open file: {e}"))),
    };
    let metadata = file
        .metadata()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read metadata: {e}")))?;
    if !metadata.is_file() {
        return Err(AppError::NotFound(format!("File '{filename}' not found")));
    }

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, metadata.len().to_string())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
