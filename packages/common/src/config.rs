use std::path::PathBuf;

use serde::Deserialize;

use crate::reading_time::DEFAULT_WORDS_PER_MINUTE;

/// Upload storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory uploaded documents are written to. Default: "_posts".
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Prefix of the public URL of a stored file. Default: "http://localhost:3000/files".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Largest accepted upload in bytes. Default: 16 MiB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("_posts")
}
fn default_base_url() -> String {
    "http://localhost:3000/files".into()
}
fn default_max_file_size() -> u64 {
    16 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            base_url: default_base_url(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// Reading time estimation settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ReadingConfig {
    /// Assumed reading speed. Default: 200.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

fn default_words_per_minute() -> u32 {
    DEFAULT_WORDS_PER_MINUTE
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
        }
    }
}
