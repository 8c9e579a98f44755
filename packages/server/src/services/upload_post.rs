use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::{debug, info};

use crate::entity::{post, upload_post};
use crate::error::AppError;
use crate::hooks::upload_post::{UploadPostHooks, UploadPostInput};
use crate::hooks::{HookContext, ListHooks, Operation};
use crate::models::upload::UpdateUploadPostRequest;

/// Find an upload by ID or return 404.
pub async fn find_upload<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<upload_post::Model, AppError> {
    upload_post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".into()))
}

/// Record a stored file as a new draft upload.
pub async fn create_upload(
    ctx: &HookContext<'_>,
    filename: &str,
    filesize: i64,
) -> Result<upload_post::Model, AppError> {
    let hooks = UploadPostHooks;
    let input = hooks
        .resolve_input(
            ctx,
            Operation::Create,
            UploadPostInput::with_attachment(filename, filesize),
        )
        .await?;

    let attachment = input.attachment.as_ref();
    let model = upload_post::ActiveModel {
        is_live: Set(false),
        upload_time: Set(input.upload_time.clone()),
        filename: Set(attachment.map(|a| a.filename.clone())),
        filesize: Set(attachment.map(|a| a.filesize)),
        preview: Set(input.preview.clone().unwrap_or_default()),
        post_id: Set(None),
        created_at: Set(ctx.clock.now()),
        ..Default::default()
    }
    .insert(ctx.conn)
    .await?;

    hooks
        .after_operation(ctx, Operation::Create, None, &model)
        .await?;
    debug!(list = hooks.list_key(), id = model.id, filename, "Created");
    Ok(model)
}

/// Update the live flag. A draft going live is promoted into a post.
///
/// The first statement is a write, so the row is read under the database
/// write lock and concurrent toggles run one after another. The false -> true
/// flip is claimed with a conditional update that only one of them can win.
pub async fn update_upload(
    ctx: &HookContext<'_>,
    id: i32,
    req: UpdateUploadPostRequest,
) -> Result<upload_post::Model, AppError> {
    let hooks = UploadPostHooks;
    let db = ctx.conn;

    let input = hooks
        .resolve_input(ctx, Operation::Update, UploadPostInput::default())
        .await?;

    let touched = upload_post::Entity::update_many()
        .col_expr(upload_post::Column::UploadTime, Expr::value(input.upload_time))
        .filter(upload_post::Column::Id.eq(id))
        .exec(db)
        .await?
        .rows_affected;
    if touched == 0 {
        return Err(AppError::NotFound("Upload not found".into()));
    }

    let mut original = find_upload(db, id).await?;
    match req.is_live {
        Some(true) if !original.is_live => {
            let claimed = upload_post::Entity::update_many()
                .col_expr(upload_post::Column::IsLive, Expr::value(true))
                .filter(upload_post::Column::Id.eq(id))
                .filter(upload_post::Column::IsLive.eq(false))
                .exec(db)
                .await?
                .rows_affected;
            if claimed == 0 {
                info!(id, "Upload already went live elsewhere; skipping promotion");
                original.is_live = true;
            }
        }
        Some(false) if original.is_live => {
            upload_post::Entity::update_many()
                .col_expr(upload_post::Column::IsLive, Expr::value(false))
                .filter(upload_post::Column::Id.eq(id))
                .exec(db)
                .await?;
        }
        _ => {}
    }

    let updated = find_upload(db, id).await?;
    hooks
        .after_operation(ctx, Operation::Update, Some(&original), &updated)
        .await?;

    find_upload(db, id).await
}

/// Point an upload at a newly stored file and refresh its preview.
pub async fn replace_attachment(
    ctx: &HookContext<'_>,
    id: i32,
    filename: &str,
    filesize: i64,
) -> Result<upload_post::Model, AppError> {
    let hooks = UploadPostHooks;
    let db = ctx.conn;
    let existing = find_upload(db, id).await?;

    let input = hooks
        .resolve_input(
            ctx,
            Operation::Update,
            UploadPostInput::with_attachment(filename, filesize),
        )
        .await?;

    let mut active: upload_post::ActiveModel = existing.clone().into();
    active.upload_time = Set(input.upload_time);
    if let Some(attachment) = input.attachment {
        active.filename = Set(Some(attachment.filename));
        active.filesize = Set(Some(attachment.filesize));
    }
    if let Some(preview) = input.preview {
        active.preview = Set(preview);
    }
    let updated = active.update(db).await?;

    hooks
        .after_operation(ctx, Operation::Update, Some(&existing), &updated)
        .await?;
    Ok(updated)
}

/// Delete an upload record. The stored file is left in place.
pub async fn delete_upload(ctx: &HookContext<'_>, id: i32) -> Result<(), AppError> {
    let hooks = UploadPostHooks;
    let db = ctx.conn;
    let existing = find_upload(db, id).await?;

    post::Entity::update_many()
        .col_expr(post::Column::AttachmentId, Expr::value(None::<i32>))
        .filter(post::Column::AttachmentId.eq(id))
        .exec(db)
        .await?;
    upload_post::Entity::delete_by_id(id).exec(db).await?;

    hooks
        .after_operation(ctx, Operation::Delete, Some(&existing), &existing)
        .await?;
    debug!(list = hooks.list_key(), id, "Deleted");
    Ok(())
}
