pub mod category;
pub mod files;
pub mod post;
pub mod tag;
pub mod upload;
