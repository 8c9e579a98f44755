use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{post, post_tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::hooks::HookContext;
use crate::models::post::*;
use crate::services::post::{self as service, NewPost, find_post, tag_ids_for};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Create a new post",
    description = "Creates a post. When `ctime` is 0 or omitted the server stamps `ctime` and \
        `date`; `reading_time` is always computed from `content`. Without a `slug` one is \
        derived from the title and made unique. Setting `prev_article_id` or \
        `next_article_id` also updates the neighbour's inverse link.",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(title = %payload.title))]
pub async fn create_post(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_post(&payload)?;

    let txn = state.db.begin().await?;
    let ctx = HookContext::new(&state, &txn);
    let model = service::create_post(&ctx, NewPost::from_request(payload)).await?;
    let tag_ids = tag_ids_for(&txn, model.id).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse::from_model(model, tag_ids)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "List posts",
    description = "Returns a paginated list of posts, newest first. Content is omitted. \
        Optionally filtered by tag or category.",
    params(PostListQuery),
    responses(
        (status = 200, description = "List of posts", body = PostListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select = post::Entity::find();
    if let Some(tag_id) = query.tag_id {
        select = select.filter(
            post::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(post_tag::Column::PostId)
                    .from(post_tag::Entity)
                    .and_where(post_tag::Column::TagId.eq(tag_id))
                    .to_owned(),
            ),
        );
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(post::Column::CategoryId.eq(category_id));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .select_only()
        .column(post::Column::Id)
        .column(post::Column::Slug)
        .column(post::Column::Title)
        .column(post::Column::CategoryId)
        .column(post::Column::Ctime)
        .column(post::Column::Date)
        .column(post::Column::ReadingTime)
        .column(post::Column::Brief)
        .order_by_desc(post::Column::Ctime)
        .order_by_desc(post::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .into_model::<PostListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(PostListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Posts",
    operation_id = "getPost",
    summary = "Get a post by ID",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let model = find_post(&state.db, id).await?;
    let tag_ids = tag_ids_for(&state.db, id).await?;
    Ok(Json(PostResponse::from_model(model, tag_ids)))
}

#[utoipa::path(
    get,
    path = "/by-slug/{slug}",
    tag = "Posts",
    operation_id = "getPostBySlug",
    summary = "Get a post by slug",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let model = post::Entity::find()
        .filter(post::Column::Slug.eq(&slug))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
    let tag_ids = tag_ids_for(&state.db, model.id).await?;
    Ok(Json(PostResponse::from_model(model, tag_ids)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Posts",
    operation_id = "updatePost",
    summary = "Update an existing post",
    description = "Partially updates a post. Only provided fields are modified; `null` clears \
        `category_id` and the neighbour links. `tag_ids` replaces the whole tag set. Derived \
        fields (`ctime`, `date`, `reading_time`) are not recomputed. An empty payload returns \
        the current resource unchanged.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    validate_update_post(&payload)?;

    if payload == UpdatePostRequest::default() {
        let existing = find_post(&state.db, id).await?;
        let tag_ids = tag_ids_for(&state.db, id).await?;
        return Ok(Json(PostResponse::from_model(existing, tag_ids)));
    }

    let txn = state.db.begin().await?;
    let ctx = HookContext::new(&state, &txn);
    let model = service::update_post(&ctx, id, payload).await?;
    let tag_ids = tag_ids_for(&txn, id).await?;
    txn.commit().await?;

    Ok(Json(PostResponse::from_model(model, tag_ids)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Posts",
    operation_id = "deletePost",
    summary = "Delete a post by ID",
    description = "Deletes a post and detaches its tags, neighbour links and source upload.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let ctx = HookContext::new(&state, &txn);
    service::delete_post(&ctx, id).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
