use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::post;
use crate::error::AppError;
use crate::hooks::post::DEFAULT_TITLE;

pub use super::shared::Pagination;
use super::shared::{double_option, validate_relation_ids, validate_slug, validate_title};

/// Upper bound on tags attached to one post.
pub const MAX_TAGS_PER_POST: usize = 64;

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

#[derive(Deserialize, ToSchema)]
pub struct CreatePostRequest {
    /// Unique URL slug. Derived from the title when omitted.
    #[schema(example = "hello-world")]
    pub slug: Option<String>,
    #[serde(default = "default_title")]
    #[schema(example = "Hello World")]
    pub title: String,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    pub category_id: Option<i32>,
    /// Creation time in epoch milliseconds. `0` (default) lets the server set it.
    #[serde(default)]
    pub ctime: i64,
    /// Display date (`MM-DD`). Only used when `ctime` is non-zero.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub content: String,
    pub prev_article_id: Option<i32>,
    pub next_article_id: Option<i32>,
}

#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdatePostRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    /// Replaces the full tag set when present.
    pub tag_ids: Option<Vec<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    pub ctime: Option<i64>,
    pub date: Option<String>,
    pub brief: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub prev_article_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub next_article_id: Option<Option<i32>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub tag_ids: Vec<i32>,
    pub category_id: Option<i32>,
    /// Upload this post was promoted from.
    pub attachment_id: Option<i32>,
    #[schema(example = 1709812800000_i64)]
    pub ctime: i64,
    #[schema(example = "03-07")]
    pub date: String,
    /// Estimated whole reading minutes.
    #[schema(example = "3")]
    pub reading_time: String,
    pub prev_article_id: Option<i32>,
    pub next_article_id: Option<i32>,
    pub brief: String,
    pub content: String,
}

#[derive(Serialize, FromQueryResult, ToSchema)]
pub struct PostListItem {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub category_id: Option<i32>,
    pub ctime: i64,
    pub date: String,
    pub reading_time: String,
    pub brief: String,
}

#[derive(Serialize, ToSchema)]
pub struct PostListResponse {
    pub data: Vec<PostListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Only posts carrying this tag.
    pub tag_id: Option<i32>,
    /// Only posts in this category.
    pub category_id: Option<i32>,
}

impl PostResponse {
    pub fn from_model(m: post::Model, tag_ids: Vec<i32>) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
            title: m.title,
            tag_ids,
            category_id: m.category_id,
            attachment_id: m.attachment_id,
            ctime: m.ctime,
            date: m.date,
            reading_time: m.reading_time,
            prev_article_id: m.prev_article_id,
            next_article_id: m.next_article_id,
            brief: m.brief,
            content: m.content,
        }
    }
}

pub fn validate_create_post(req: &CreatePostRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if let Some(ref slug) = req.slug {
        validate_slug(slug)?;
    }
    validate_relation_ids(&req.tag_ids, "tag_ids", MAX_TAGS_PER_POST)?;
    if req.ctime < 0 {
        return Err(AppError::Validation("ctime must be >= 0".into()));
    }
    if req.prev_article_id.is_some() && req.prev_article_id == req.next_article_id {
        return Err(AppError::Validation(
            "prev_article_id and next_article_id must differ".into(),
        ));
    }
    Ok(())
}

pub fn validate_update_post(req: &UpdatePostRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref slug) = req.slug {
        validate_slug(slug)?;
    }
    if let Some(ref tag_ids) = req.tag_ids {
        validate_relation_ids(tag_ids, "tag_ids", MAX_TAGS_PER_POST)?;
    }
    if let Some(ctime) = req.ctime
        && ctime < 0
    {
        return Err(AppError::Validation("ctime must be >= 0".into()));
    }
    if let (Some(Some(prev)), Some(Some(next))) = (req.prev_article_id, req.next_article_id)
        && prev == next
    {
        return Err(AppError::Validation(
            "prev_article_id and next_article_id must differ".into(),
        ));
    }
    Ok(())
}
