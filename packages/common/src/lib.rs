pub mod clock;
pub mod config;
pub mod reading_time;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ReadingConfig, StorageConfig};
pub use reading_time::{ReadingTime, ReadingTimeEstimator};
