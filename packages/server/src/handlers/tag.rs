use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{post_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::taxonomy::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    request_body = CreateTermRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_tag(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_term(&payload, "Tag")?;

    let model = tag::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TagResponse::from_model(model, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List all tags",
    description = "Returns every tag, ascending by ID, with the posts carrying it.",
    responses(
        (status = 200, description = "List of tags", body = Vec<TagResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Id)
        .all(&state.db)
        .await?;

    let pairs: Vec<(i32, i32)> = post_tag::Entity::find()
        .select_only()
        .column(post_tag::Column::TagId)
        .column(post_tag::Column::PostId)
        .order_by_asc(post_tag::Column::PostId)
        .into_tuple()
        .all(&state.db)
        .await?;
    let mut posts_by_tag: HashMap<i32, Vec<i32>> = HashMap::new();
    for (tag_id, post_id) in pairs {
        posts_by_tag.entry(tag_id).or_default().push(post_id);
    }

    let data = tags
        .into_iter()
        .map(|t| {
            let post_ids = posts_by_tag.remove(&t.id).unwrap_or_default();
            TagResponse::from_model(t, post_ids)
        })
        .collect();
    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tags",
    operation_id = "getTag",
    summary = "Get a tag by ID",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag details", body = TagResponse),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    let model = find_tag(&state.db, id).await?;
    let post_ids = post_ids_for(&state.db, id).await?;
    Ok(Json(TagResponse::from_model(model, post_ids)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Rename a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = UpdateTermRequest,
    responses(
        (status = 200, description = "Tag updated", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTermRequest>,
) -> Result<Json<TagResponse>, AppError> {
    validate_update_term(&payload, "Tag")?;

    let existing = find_tag(&state.db, id).await?;
    let model = match payload.name {
        Some(name) => {
            let mut active: tag::ActiveModel = existing.into();
            active.name = Set(name.trim().to_string());
            active.update(&state.db).await?
        }
        None => existing,
    };
    let post_ids = post_ids_for(&state.db, id).await?;
    Ok(Json(TagResponse::from_model(model, post_ids)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Deletes a tag and removes it from every post.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_tag(&txn, id).await?;

    post_tag::Entity::delete_many()
        .filter(post_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_tag<C: ConnectionTrait>(db: &C, id: i32) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))
}

async fn post_ids_for<C: ConnectionTrait>(db: &C, tag_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(post_tag::Entity::find()
        .filter(post_tag::Column::TagId.eq(tag_id))
        .select_only()
        .column(post_tag::Column::PostId)
        .order_by_asc(post_tag::Column::PostId)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}
