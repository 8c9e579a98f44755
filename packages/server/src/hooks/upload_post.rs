use async_trait::async_trait;
use common::storage::{FileStore, StorageError};
use sea_orm::prelude::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{error, info, warn};

use super::{HookContext, ListHooks, Operation};
use crate::entity::{post, upload_post};
use crate::error::AppError;
use crate::services::post::{NewPost, create_post};
use crate::utils::front_matter::PostDraft;

/// A freshly stored file being attached to an upload record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentInput {
    pub filename: String,
    pub filesize: i64,
}

/// Upload fields as resolved before a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPostInput {
    pub upload_time: String,
    /// `None` keeps the current attachment.
    pub attachment: Option<AttachmentInput>,
    /// Set by `resolve_input` whenever an attachment is present.
    pub preview: Option<String>,
}

impl UploadPostInput {
    pub fn with_attachment(filename: impl Into<String>, filesize: i64) -> Self {
        Self {
            attachment: Some(AttachmentInput {
                filename: filename.into(),
                filesize,
            }),
            ..Default::default()
        }
    }
}

pub struct UploadPostHooks;

#[async_trait]
impl ListHooks for UploadPostHooks {
    type Input = UploadPostInput;
    type Item = upload_post::Model;

    fn list_key(&self) -> &'static str {
        "UploadPost"
    }

    async fn resolve_input(
        &self,
        ctx: &HookContext<'_>,
        _op: Operation,
        mut input: UploadPostInput,
    ) -> Result<UploadPostInput, AppError> {
        input.upload_time = ctx.clock.now_millis().to_string();
        if let Some(attachment) = &input.attachment {
            let preview = extract_preview(ctx.file_store, &attachment.filename).await?;
            info!(
                filename = %attachment.filename,
                chars = preview.chars().count(),
                "Extracted upload preview"
            );
            input.preview = Some(preview);
        }
        Ok(input)
    }

    async fn after_operation(
        &self,
        ctx: &HookContext<'_>,
        op: Operation,
        original: Option<&upload_post::Model>,
        item: &upload_post::Model,
    ) -> Result<(), AppError> {
        let Some(original) = original else {
            return Ok(());
        };
        if op != Operation::Update || !is_publish_transition(original, item) {
            return Ok(());
        }

        match promote(ctx, item).await {
            Ok(post) => {
                info!(
                    upload_id = item.id,
                    post_id = post.id,
                    slug = %post.slug,
                    "Promoted upload to post"
                );
                Ok(())
            }
            Err(e) => {
                error!(upload_id = item.id, error = ?e, "Promotion failed");
                Err(e)
            }
        }
    }
}

/// Only a draft going live publishes.
pub fn is_publish_transition(before: &upload_post::Model, after: &upload_post::Model) -> bool {
    !before.is_live && after.is_live
}

/// Read a stored attachment as text.
pub async fn extract_preview(store: &dyn FileStore, filename: &str) -> Result<String, AppError> {
    store.read_text(filename).await.map_err(|e| match e {
        err @ StorageError::InvalidFilename(_) => AppError::from(err),
        other => {
            warn!(filename, error = %other, "Attachment could not be read");
            AppError::AttachmentUnreadable(format!(
                "Attachment '{filename}' could not be read: {other}"
            ))
        }
    })
}

/// Turn a draft upload into a post and link the two.
///
/// An upload that was published before and taken offline gets a fresh post;
/// the earlier post stays but no longer points back at the upload.
async fn promote(
    ctx: &HookContext<'_>,
    upload: &upload_post::Model,
) -> Result<post::Model, AppError> {
    let draft = PostDraft::parse(&upload.preview)
        .map_err(|e| AppError::Validation(format!("Invalid front matter: {e}")))?;
    let post = create_post(ctx, NewPost::from_draft(draft, upload.id)).await?;

    let mut upload_active: upload_post::ActiveModel = upload.clone().into();
    upload_active.preview = Set(String::new());
    upload_active.post_id = Set(Some(post.id));
    upload_active.update(ctx.conn).await?;

    if let Some(previous) = upload.post_id {
        post::Entity::update_many()
            .col_expr(post::Column::AttachmentId, Expr::value(None::<i32>))
            .filter(post::Column::AttachmentId.eq(upload.id))
            .exec(ctx.conn)
            .await?;
        info!(upload_id = upload.id, previous, "Detached earlier post from upload");
    }

    let mut post_active: post::ActiveModel = post.into();
    post_active.attachment_id = Set(Some(upload.id));
    Ok(post_active.update(ctx.conn).await?)
}
