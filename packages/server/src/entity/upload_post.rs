use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload_post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Flipping this false -> true promotes the upload into a post.
    pub is_live: bool,

    /// Epoch milliseconds of the last resolved write, as a string.
    pub upload_time: String,

    /// Name of the stored file under the upload directory.
    pub filename: Option<String>,
    pub filesize: Option<i64>,

    #[sea_orm(column_type = "Text")]
    pub preview: String,

    /// Post created from this upload. Mirrors `post.attachment_id`.
    #[sea_orm(unique)]
    pub post_id: Option<i32>,
    #[sea_orm(belongs_to, from = "post_id", to = "id")]
    pub post: HasOne<super::post::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
