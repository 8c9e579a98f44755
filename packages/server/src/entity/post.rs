use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,

    #[sea_orm(has_many, via = "post_tag")]
    pub tags: HasMany<super::tag::Entity>,

    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    /// Upload this post was promoted from. Mirrors `upload_post.post_id`.
    #[sea_orm(unique)]
    pub attachment_id: Option<i32>,

    /// Milliseconds since epoch; 0 until derived on create.
    pub ctime: i64,
    pub date: String, // MM-DD
    pub reading_time: String,

    /// Doubly-linked ordering; `a.next_article_id == b` iff `b.prev_article_id == a`.
    #[sea_orm(unique)]
    pub prev_article_id: Option<i32>,
    #[sea_orm(unique)]
    pub next_article_id: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub brief: String,
    #[sea_orm(column_type = "Text")]
    pub content: String, // in Markdown
}

impl ActiveModelBehavior for ActiveModel {}
