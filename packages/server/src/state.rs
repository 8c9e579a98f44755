use std::sync::Arc;

use common::storage::FileStore;
use common::{Clock, ReadingTimeEstimator};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub file_store: Arc<dyn FileStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn reading_time(&self) -> ReadingTimeEstimator {
        ReadingTimeEstimator::new(self.config.reading.words_per_minute)
    }
}
