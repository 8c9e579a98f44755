//! Lifecycle hooks for the content lists.
//!
//! Every mutation goes through the same stages, driven explicitly by the
//! service layer: validate, `resolve_input`, persist, `after_operation`.
//! All stages share one database transaction, so a failing hook aborts the
//! whole write.

pub mod post;
pub mod upload_post;

use async_trait::async_trait;
use common::storage::FileStore;
use common::{Clock, ReadingTimeEstimator};
use sea_orm::DatabaseTransaction;

use crate::error::AppError;
use crate::state::AppState;

/// Kind of mutation a hook is invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Everything a hook may touch while a mutation is in flight.
pub struct HookContext<'a> {
    pub conn: &'a DatabaseTransaction,
    pub clock: &'a dyn Clock,
    pub file_store: &'a dyn FileStore,
    pub reading_time: ReadingTimeEstimator,
}

impl<'a> HookContext<'a> {
    pub fn new(state: &'a AppState, conn: &'a DatabaseTransaction) -> Self {
        Self {
            conn,
            clock: state.clock.as_ref(),
            file_store: state.file_store.as_ref(),
            reading_time: state.reading_time(),
        }
    }
}

/// Hooks attached to one list.
///
/// `Input` is the resolved data about to be written; `Item` is the stored row.
#[async_trait]
pub trait ListHooks: Send + Sync {
    type Input: Send;
    type Item: Send + Sync;

    /// List identifier, used in logs.
    fn list_key(&self) -> &'static str;

    /// Runs before persistence and may rewrite the input.
    async fn resolve_input(
        &self,
        _ctx: &HookContext<'_>,
        _op: Operation,
        input: Self::Input,
    ) -> Result<Self::Input, AppError> {
        Ok(input)
    }

    /// Runs after the row is written. `original` is the row before an update.
    async fn after_operation(
        &self,
        _ctx: &HookContext<'_>,
        _op: Operation,
        _original: Option<&Self::Item>,
        _item: &Self::Item,
    ) -> Result<(), AppError> {
        Ok(())
    }
}
