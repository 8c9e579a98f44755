use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{category, tag};
use crate::error::AppError;

use super::shared::validate_name;

/// Body for creating a tag or a category.
#[derive(Deserialize, ToSchema)]
pub struct CreateTermRequest {
    #[schema(example = "rust")]
    pub name: String,
}

#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdateTermRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    /// Posts carrying this tag, ascending.
    pub post_ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    /// Posts filed under this category, ascending.
    pub post_ids: Vec<i32>,
}

impl TagResponse {
    pub fn from_model(m: tag::Model, post_ids: Vec<i32>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            post_ids,
        }
    }
}

impl CategoryResponse {
    pub fn from_model(m: category::Model, post_ids: Vec<i32>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            post_ids,
        }
    }
}

pub fn validate_create_term(req: &CreateTermRequest, what: &str) -> Result<(), AppError> {
    validate_name(&req.name, what)
}

pub fn validate_update_term(req: &UpdateTermRequest, what: &str) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name, what)?;
    }
    Ok(())
}
