use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use common::{Clock, ReadingTimeEstimator};

use super::{HookContext, ListHooks, Operation};
use crate::entity::post;
use crate::error::AppError;

/// Title given to posts created without one.
pub const DEFAULT_TITLE: &str = "default title";

/// Scalar post fields as resolved before a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub slug: String,
    pub title: String,
    pub category_id: Option<i32>,
    pub ctime: i64,
    pub date: String,
    pub reading_time: String,
    pub brief: String,
    pub content: String,
}

pub struct PostHooks;

#[async_trait]
impl ListHooks for PostHooks {
    type Input = PostInput;
    type Item = post::Model;

    fn list_key(&self) -> &'static str {
        "Post"
    }

    async fn resolve_input(
        &self,
        ctx: &HookContext<'_>,
        op: Operation,
        mut input: PostInput,
    ) -> Result<PostInput, AppError> {
        if op == Operation::Create {
            derive_fields(&mut input, ctx.clock, &ctx.reading_time);
        }
        Ok(input)
    }
}

/// Fill `ctime`, `date` and `reading_time` for a post being created.
///
/// `ctime == 0` means "unset": only then are `ctime` and `date` stamped from
/// the clock. A caller-supplied `ctime` keeps whatever `date` was submitted.
/// `reading_time` is always recomputed.
pub fn derive_fields(input: &mut PostInput, clock: &dyn Clock, reading_time: &ReadingTimeEstimator) {
    if input.ctime == 0 {
        let now = clock.now();
        input.ctime = now.timestamp_millis();
        input.date = display_date(now);
    }
    input.reading_time = reading_time.label(&input.content);
}

/// Month and day in local time, e.g. `"03-07"`.
pub fn display_date(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%m-%d").to_string()
}
