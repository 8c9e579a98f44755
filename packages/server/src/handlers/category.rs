use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, post};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::taxonomy::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    request_body = CreateTermRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_term(&payload, "Category")?;

    let model = category::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse::from_model(model, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List all categories",
    description = "Returns every category, ascending by ID, with the posts filed under it.",
    responses(
        (status = 200, description = "List of categories", body = Vec<CategoryResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(&state.db)
        .await?;

    let pairs: Vec<(i32, i32)> = post::Entity::find()
        .filter(post::Column::CategoryId.is_not_null())
        .select_only()
        .column(post::Column::CategoryId)
        .column(post::Column::Id)
        .order_by_asc(post::Column::Id)
        .into_tuple()
        .all(&state.db)
        .await?;
    let mut posts_by_category: HashMap<i32, Vec<i32>> = HashMap::new();
    for (category_id, post_id) in pairs {
        posts_by_category.entry(category_id).or_default().push(post_id);
    }

    let data = categories
        .into_iter()
        .map(|c| {
            let post_ids = posts_by_category.remove(&c.id).unwrap_or_default();
            CategoryResponse::from_model(c, post_ids)
        })
        .collect();
    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category by ID",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category details", body = CategoryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    let model = find_category(&state.db, id).await?;
    let post_ids = post_ids_for(&state.db, id).await?;
    Ok(Json(CategoryResponse::from_model(model, post_ids)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Rename a category",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateTermRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTermRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    validate_update_term(&payload, "Category")?;

    let existing = find_category(&state.db, id).await?;
    let model = match payload.name {
        Some(name) => {
            let mut active: category::ActiveModel = existing.into();
            active.name = Set(name.trim().to_string());
            active.update(&state.db).await?
        }
        None => existing,
    };
    let post_ids = post_ids_for(&state.db, id).await?;
    Ok(Json(CategoryResponse::from_model(model, post_ids)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Deletes a category. Its posts are kept and become uncategorised.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_category(&txn, id).await?;

    post::Entity::update_many()
        .col_expr(post::Column::CategoryId, Expr::value(None::<i32>))
        .filter(post::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    category::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

async fn post_ids_for<C: ConnectionTrait>(db: &C, category_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(post::Entity::find()
        .filter(post::Column::CategoryId.eq(category_id))
        .select_only()
        .column(post::Column::Id)
        .order_by_asc(post::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}
