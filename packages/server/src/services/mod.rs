//! Write paths for the content lists.
//!
//! Each function runs inside the caller's transaction and drives the list's
//! hooks around the actual persistence.

pub mod post;
pub mod upload_post;
