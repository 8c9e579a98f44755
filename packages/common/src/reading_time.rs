/// Words per minute assumed when no configuration overrides it.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Result of estimating how long a text takes to read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingTime {
    /// Number of whitespace-separated words.
    pub words: usize,
    /// Exact estimate in minutes, before truncation.
    pub minutes: f64,
}

impl ReadingTime {
    /// Whole minutes, truncated toward zero.
    pub fn whole_minutes(&self) -> u64 {
        self.minutes.trunc() as u64
    }
}

/// Word-count based reading time estimator.
#[derive(Debug, Clone, Copy)]
pub struct ReadingTimeEstimator {
    words_per_minute: u32,
}

impl Default for ReadingTimeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS_PER_MINUTE)
    }
}

impl ReadingTimeEstimator {
    /// A zero rate is treated as one word per minute.
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
        }
    }

    pub fn words_per_minute(&self) -> u32 {
        self.words_per_minute
    }

    pub fn estimate(&self, text: &str) -> ReadingTime {
        let words = text.split_whitespace().count();
        ReadingTime {
            words,
            minutes: words as f64 / f64::from(self.words_per_minute),
        }
    }

    /// Whole reading minutes rendered as a decimal string, e.g. `"3"`.
    pub fn label(&self, text: &str) -> String {
        self.estimate(text).whole_minutes().to_string()
    }
}
