use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::validate_upload_filename;
use sea_orm::*;
use tracing::{instrument, warn};

use crate::entity::upload_post;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::hooks::HookContext;
use crate::models::upload::*;
use crate::services::upload_post::{self as service, find_upload};
use crate::state::AppState;

/// Multipart overhead allowed on top of the configured file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_file_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    operation_id = "createUpload",
    summary = "Upload a Markdown document",
    description = "Stores the `file` multipart field under its original filename, replacing any \
        file of the same name, and creates a draft upload whose `preview` holds the file's text.",
    request_body(content_type = "multipart/form-data", description = "Document in the `file` field"),
    responses(
        (status = 201, description = "Upload created", body = UploadPostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 422, description = "Stored file is not readable text (ATTACHMENT_UNREADABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (filename, bytes) = read_file_field(multipart).await?;
    let (filename, filesize, existed) = store_file(&state, &filename, &bytes).await?;

    let result = async {
        let txn = state.db.begin().await?;
        let ctx = HookContext::new(&state, &txn);
        let model = service::create_upload(&ctx, &filename, filesize).await?;
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    match result {
        Ok(model) => Ok((StatusCode::CREATED, Json(to_response(&state, model)))),
        Err(e) => {
            discard_new_file(&state, &filename, existed).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Uploads",
    operation_id = "listUploads",
    summary = "List uploads",
    description = "Returns every upload, newest first.",
    responses(
        (status = 200, description = "List of uploads", body = Vec<UploadPostResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_uploads(
    State(state): State<AppState>,
) -> Result<Json<Vec<UploadPostResponse>>, AppError> {
    let uploads = upload_post::Entity::find()
        .order_by_desc(upload_post::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(
        uploads
            .into_iter()
            .map(|m| to_response(&state, m))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "getUpload",
    summary = "Get an upload by ID",
    params(("id" = i32, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "Upload details", body = UploadPostResponse),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_upload(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UploadPostResponse>, AppError> {
    let model = find_upload(&state.db, id).await?;
    Ok(Json(to_response(&state, model)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "updateUpload",
    summary = "Publish or unpublish an upload",
    description = "Sets `is_live`. Turning a draft live creates a post from its preview, links \
        the two and clears the preview, all in one transaction. Repeating the toggle, or \
        turning a live upload off, does not create or remove posts.",
    params(("id" = i32, Path, description = "Upload ID")),
    request_body = UpdateUploadPostRequest,
    responses(
        (status = 200, description = "Upload updated", body = UploadPostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id, is_live = ?payload.is_live))]
pub async fn update_upload(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUploadPostRequest>,
) -> Result<Json<UploadPostResponse>, AppError> {
    let txn = state.db.begin().await?;
    let ctx = HookContext::new(&state, &txn);
    let model = service::update_upload(&ctx, id, payload).await?;
    txn.commit().await?;

    Ok(Json(to_response(&state, model)))
}

#[utoipa::path(
    put,
    path = "/{id}/attachment",
    tag = "Uploads",
    operation_id = "replaceUploadAttachment",
    summary = "Replace the attached document",
    description = "Stores a new `file` for an existing upload and refreshes its preview. The \
        live flag and any linked post are left alone.",
    params(("id" = i32, Path, description = "Upload ID")),
    request_body(content_type = "multipart/form-data", description = "Document in the `file` field"),
    responses(
        (status = 200, description = "Attachment replaced", body = UploadPostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Stored file is not readable text (ATTACHMENT_UNREADABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(id))]
pub async fn replace_attachment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<UploadPostResponse>, AppError> {
    find_upload(&state.db, id).await?;

    let (filename, bytes) = read_file_field(multipart).await?;
    let (filename, filesize, existed) = store_file(&state, &filename, &bytes).await?;

    let result = async {
        let txn = state.db.begin().await?;
        let ctx = HookContext::new(&state, &txn);
        let model = service::replace_attachment(&ctx, id, &filename, filesize).await?;
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    match result {
        Ok(model) => Ok(Json(to_response(&state, model))),
        Err(e) => {
            discard_new_file(&state, &filename, existed).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "deleteUpload",
    summary = "Delete an upload",
    description = "Deletes the upload record and unlinks any post created from it. The stored \
        file is kept.",
    params(("id" = i32, Path, description = "Upload ID")),
    responses(
        (status = 204, description = "Upload deleted"),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_upload(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let ctx = HookContext::new(&state, &txn);
    service::delete_upload(&ctx, id).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_response(state: &AppState, model: upload_post::Model) -> UploadPostResponse {
    UploadPostResponse::from_model(model, |name| state.file_store.url(name))
}

/// Pull the `file` field out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(AppError::Validation("Missing 'file' field".into()))
}

/// Write the upload to the file store.
///
/// Returns the validated filename, its size and whether a file of that name
/// already existed.
async fn store_file(
    state: &AppState,
    filename: &str,
    bytes: &[u8],
) -> Result<(String, i64, bool), AppError> {
    let filename = validate_upload_filename(filename)
        .map_err(|e| AppError::Validation(format!("Invalid filename: {e}")))?
        .to_string();
    let existed = state.file_store.exists(&filename).await?;
    let size = state.file_store.put(&filename, bytes).await?;
    Ok((filename, i64::try_from(size).unwrap_or(i64::MAX), existed))
}

/// Remove a file stored for a request that then failed, unless it replaced
/// an existing one.
async fn discard_new_file(state: &AppState, filename: &str, existed: bool) {
    if existed {
        return;
    }
    if let Err(e) = state.file_store.delete(filename).await {
        warn!(filename, error = %e, "Failed to remove stored file after error");
    }
}
