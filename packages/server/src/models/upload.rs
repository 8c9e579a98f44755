use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::upload_post;

/// Response DTO for an upload record.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadPostResponse {
    pub id: i32,
    /// Whether the upload has been published.
    pub is_live: bool,
    /// Epoch milliseconds of the last write.
    #[schema(example = "1709812800000")]
    pub upload_time: String,
    #[schema(example = "post1.md")]
    pub filename: Option<String>,
    /// Stored file size in bytes.
    pub filesize: Option<i64>,
    /// Public URL of the stored file.
    #[schema(example = "http://localhost:3000/files/post1.md")]
    pub url: Option<String>,
    /// Raw text of the attachment. Empty once promoted.
    pub preview: String,
    /// Post created from this upload.
    pub post_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdateUploadPostRequest {
    /// Setting this to `true` on a draft publishes it as a new post.
    pub is_live: Option<bool>,
}

impl UploadPostResponse {
    /// `url_for` maps a stored filename to its public URL.
    pub fn from_model(m: upload_post::Model, url_for: impl Fn(&str) -> String) -> Self {
        Self {
            id: m.id,
            is_live: m.is_live,
            upload_time: m.upload_time,
            url: m.filename.as_deref().map(url_for),
            filename: m.filename,
            filesize: m.filesize,
            preview: m.preview,
            post_id: m.post_id,
            created_at: m.created_at,
        }
    }
}
