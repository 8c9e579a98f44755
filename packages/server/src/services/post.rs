use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::debug;

use crate::entity::{category, post, post_tag, tag, upload_post};
use crate::error::AppError;
use crate::hooks::post::{DEFAULT_TITLE, PostHooks, PostInput};
use crate::hooks::{HookContext, ListHooks, Operation};
use crate::models::post::{CreatePostRequest, UpdatePostRequest};
use crate::utils::front_matter::PostDraft;
use crate::utils::slug::{candidate, slugify};

/// Gives up on slug de-duplication after this many candidates.
const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Longest title taken from an uploaded document.
const MAX_DRAFT_TITLE_CHARS: usize = 256;

/// How a new post gets its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugPolicy {
    /// Use exactly this slug; a taken slug is a conflict.
    Exact(String),
    /// Start from this base and append `-2`, `-3`, ... until free.
    Unique(String),
}

/// Everything needed to create a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub slug: SlugPolicy,
    pub title: String,
    pub tag_ids: Vec<i32>,
    pub category_id: Option<i32>,
    pub ctime: i64,
    pub date: String,
    pub brief: String,
    pub content: String,
    pub prev_article_id: Option<i32>,
    pub next_article_id: Option<i32>,
}

impl NewPost {
    /// A post carrying only the given title, slug policy and body.
    fn bare(slug: SlugPolicy, title: String, brief: String, content: String) -> Self {
        Self {
            slug,
            title,
            tag_ids: Vec::new(),
            category_id: None,
            ctime: 0,
            date: String::new(),
            brief,
            content,
            prev_article_id: None,
            next_article_id: None,
        }
    }

    pub fn from_request(req: CreatePostRequest) -> Self {
        let title = req.title.trim().to_string();
        let slug = match req.slug {
            Some(slug) => SlugPolicy::Exact(slug),
            None => SlugPolicy::Unique(slug_base(&title, "post")),
        };
        Self {
            tag_ids: req.tag_ids,
            category_id: req.category_id,
            ctime: req.ctime,
            date: req.date,
            prev_article_id: req.prev_article_id,
            next_article_id: req.next_article_id,
            ..Self::bare(slug, title, req.brief, req.content)
        }
    }

    /// A post built from a promoted upload. Slugs never conflict here:
    /// a taken one is suffixed instead.
    pub fn from_draft(draft: PostDraft, upload_id: i32) -> Self {
        let title: String = draft
            .title
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
            .chars()
            .take(MAX_DRAFT_TITLE_CHARS)
            .collect();
        let fallback = format!("upload-{upload_id}");
        let base = match draft.slug {
            Some(slug) => slug_base(&slug, &fallback),
            None => slug_base(&title, &fallback),
        };
        Self::bare(SlugPolicy::Unique(base), title, draft.brief, draft.content)
    }
}

fn slug_base(text: &str, fallback: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Which neighbour pointer of a post is being set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Prev,
    Next,
}

impl Link {
    fn column(self) -> post::Column {
        match self {
            Link::Prev => post::Column::PrevArticleId,
            Link::Next => post::Column::NextArticleId,
        }
    }

    /// Column on the partner that must point back.
    fn inverse(self) -> post::Column {
        match self {
            Link::Prev => post::Column::NextArticleId,
            Link::Next => post::Column::PrevArticleId,
        }
    }
}

/// Find a post by ID or return 404.
pub async fn find_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<post::Model, AppError> {
    post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

/// Tag IDs attached to a post, ascending.
pub async fn tag_ids_for<C: ConnectionTrait>(db: &C, post_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(post_tag::Entity::find()
        .filter(post_tag::Column::PostId.eq(post_id))
        .select_only()
        .column(post_tag::Column::TagId)
        .order_by_asc(post_tag::Column::TagId)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

async fn ensure_category_exists<C: ConnectionTrait>(
    db: &C,
    category_id: Option<i32>,
) -> Result<(), AppError> {
    let Some(id) = category_id else {
        return Ok(());
    };
    if category::Entity::find_by_id(id).one(db).await?.is_none() {
        return Err(AppError::Validation(format!("Category {id} does not exist")));
    }
    Ok(())
}

async fn ensure_tags_exist<C: ConnectionTrait>(db: &C, tag_ids: &[i32]) -> Result<(), AppError> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let found = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids.to_vec()))
        .count(db)
        .await?;
    if found != tag_ids.len() as u64 {
        return Err(AppError::Validation("One or more tag_ids do not exist".into()));
    }
    Ok(())
}

async fn slug_taken<C: ConnectionTrait>(db: &C, slug: &str) -> Result<bool, AppError> {
    let count = post::Entity::find()
        .filter(post::Column::Slug.eq(slug))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// First free slug among `base`, `base-2`, `base-3`, ...
pub async fn unique_slug<C: ConnectionTrait>(db: &C, base: &str) -> Result<String, AppError> {
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = candidate(base, attempt);
        if !slug_taken(db, &slug).await? {
            return Ok(slug);
        }
    }
    Err(AppError::Conflict(format!(
        "No free slug found for '{base}'"
    )))
}

async fn resolve_slug<C: ConnectionTrait>(db: &C, policy: SlugPolicy) -> Result<String, AppError> {
    match policy {
        SlugPolicy::Exact(slug) => {
            if slug_taken(db, &slug).await? {
                return Err(AppError::Conflict(format!("Slug '{slug}' is already taken")));
            }
            Ok(slug)
        }
        SlugPolicy::Unique(base) => unique_slug(db, &base).await,
    }
}

/// Replace the full tag set of a post.
pub async fn replace_tags<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    tag_ids: &[i32],
) -> Result<(), AppError> {
    post_tag::Entity::delete_many()
        .filter(post_tag::Column::PostId.eq(post_id))
        .exec(db)
        .await?;
    for &tag_id in tag_ids {
        post_tag::ActiveModel {
            post_id: Set(post_id),
            tag_id: Set(tag_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Point `id`'s `link` at `target` and keep the partner's inverse pointer in sync.
///
/// Any post previously linked to either side is detached first, so after the
/// call `a.next == b` holds iff `b.prev == a`.
pub async fn set_link<C: ConnectionTrait>(
    db: &C,
    id: i32,
    link: Link,
    target: Option<i32>,
) -> Result<(), AppError> {
    if let Some(target) = target {
        if target == id {
            return Err(AppError::Validation("A post cannot link to itself".into()));
        }
        if post::Entity::find_by_id(target).one(db).await?.is_none() {
            return Err(AppError::Validation(format!("Post {target} does not exist")));
        }
    }

    // Old partner of `id` stops pointing back.
    post::Entity::update_many()
        .col_expr(link.inverse(), Expr::value(None::<i32>))
        .filter(link.inverse().eq(id))
        .exec(db)
        .await?;

    match target {
        Some(target) => {
            // Whoever held `target` on this side lets go.
            post::Entity::update_many()
                .col_expr(link.column(), Expr::value(None::<i32>))
                .filter(link.column().eq(target))
                .exec(db)
                .await?;
            post::Entity::update_many()
                .col_expr(link.column(), Expr::value(target))
                .filter(post::Column::Id.eq(id))
                .exec(db)
                .await?;
            post::Entity::update_many()
                .col_expr(link.inverse(), Expr::value(id))
                .filter(post::Column::Id.eq(target))
                .exec(db)
                .await?;
        }
        None => {
            post::Entity::update_many()
                .col_expr(link.column(), Expr::value(None::<i32>))
                .filter(post::Column::Id.eq(id))
                .exec(db)
                .await?;
        }
    }

    debug!(id, ?link, ?target, "Updated post link");
    Ok(())
}

/// Create a post through the full lifecycle: derive, insert, relate.
pub async fn create_post(ctx: &HookContext<'_>, new: NewPost) -> Result<post::Model, AppError> {
    let hooks = PostHooks;
    let db = ctx.conn;

    ensure_category_exists(db, new.category_id).await?;
    ensure_tags_exist(db, &new.tag_ids).await?;
    let slug = resolve_slug(db, new.slug).await?;

    let input = PostInput {
        slug,
        title: new.title,
        category_id: new.category_id,
        ctime: new.ctime,
        date: new.date,
        reading_time: String::new(),
        brief: new.brief,
        content: new.content,
    };
    let input = hooks.resolve_input(ctx, Operation::Create, input).await?;

    let model = post::ActiveModel {
        slug: Set(input.slug),
        title: Set(input.title),
        category_id: Set(input.category_id),
        attachment_id: Set(None),
        ctime: Set(input.ctime),
        date: Set(input.date),
        reading_time: Set(input.reading_time),
        prev_article_id: Set(None),
        next_article_id: Set(None),
        brief: Set(input.brief),
        content: Set(input.content),
        ..Default::default()
    }
    .insert(db)
    .await?;

    replace_tags(db, model.id, &new.tag_ids).await?;
    if new.prev_article_id.is_some() {
        set_link(db, model.id, Link::Prev, new.prev_article_id).await?;
    }
    if new.next_article_id.is_some() {
        set_link(db, model.id, Link::Next, new.next_article_id).await?;
    }

    let model = find_post(db, model.id).await?;
    hooks
        .after_operation(ctx, Operation::Create, None, &model)
        .await?;
    debug!(list = hooks.list_key(), id = model.id, slug = %model.slug, "Created");
    Ok(model)
}

/// Apply a partial update. Derived fields are never recomputed.
pub async fn update_post(
    ctx: &HookContext<'_>,
    id: i32,
    req: UpdatePostRequest,
) -> Result<post::Model, AppError> {
    let hooks = PostHooks;
    let db = ctx.conn;
    let existing = find_post(db, id).await?;

    if let Some(ref slug) = req.slug
        && *slug != existing.slug
        && slug_taken(db, slug).await?
    {
        return Err(AppError::Conflict(format!("Slug '{slug}' is already taken")));
    }
    if let Some(category_id) = req.category_id {
        ensure_category_exists(db, category_id).await?;
    }
    if let Some(ref tag_ids) = req.tag_ids {
        ensure_tags_exist(db, tag_ids).await?;
    }

    let input = PostInput {
        slug: req.slug.unwrap_or_else(|| existing.slug.clone()),
        title: req
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| existing.title.clone()),
        category_id: req.category_id.unwrap_or(existing.category_id),
        ctime: req.ctime.unwrap_or(existing.ctime),
        date: req.date.unwrap_or_else(|| existing.date.clone()),
        reading_time: existing.reading_time.clone(),
        brief: req.brief.unwrap_or_else(|| existing.brief.clone()),
        content: req.content.unwrap_or_else(|| existing.content.clone()),
    };
    let input = hooks.resolve_input(ctx, Operation::Update, input).await?;

    let mut active: post::ActiveModel = existing.clone().into();
    active.slug = Set(input.slug);
    active.title = Set(input.title);
    active.category_id = Set(input.category_id);
    active.ctime = Set(input.ctime);
    active.date = Set(input.date);
    active.reading_time = Set(input.reading_time);
    active.brief = Set(input.brief);
    active.content = Set(input.content);
    active.update(db).await?;

    if let Some(ref tag_ids) = req.tag_ids {
        replace_tags(db, id, tag_ids).await?;
    }
    if let Some(prev) = req.prev_article_id {
        set_link(db, id, Link::Prev, prev).await?;
    }
    if let Some(next) = req.next_article_id {
        set_link(db, id, Link::Next, next).await?;
    }

    let model = find_post(db, id).await?;
    hooks
        .after_operation(ctx, Operation::Update, Some(&existing), &model)
        .await?;
    Ok(model)
}

/// Delete a post and detach everything that referenced it.
pub async fn delete_post(ctx: &HookContext<'_>, id: i32) -> Result<(), AppError> {
    let hooks = PostHooks;
    let db = ctx.conn;
    let existing = find_post(db, id).await?;

    post_tag::Entity::delete_many()
        .filter(post_tag::Column::PostId.eq(id))
        .exec(db)
        .await?;
    for column in [post::Column::PrevArticleId, post::Column::NextArticleId] {
        post::Entity::update_many()
            .col_expr(column, Expr::value(None::<i32>))
            .filter(column.eq(id))
            .exec(db)
            .await?;
    }
    upload_post::Entity::update_many()
        .col_expr(upload_post::Column::PostId, Expr::value(None::<i32>))
        .filter(upload_post::Column::PostId.eq(id))
        .exec(db)
        .await?;

    post::Entity::delete_by_id(id).exec(db).await?;

    hooks
        .after_operation(ctx, Operation::Delete, Some(&existing), &existing)
        .await?;
    debug!(list = hooks.list_key(), id, "Deleted");
    Ok(())
}
