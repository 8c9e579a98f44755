pub mod post;
pub mod shared;
pub mod taxonomy;
pub mod upload;
