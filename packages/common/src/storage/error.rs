use thiserror::Error;

use super::filename::FilenameError;

/// Errors that can occur during upload storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested file was not found.
    #[error("file not found: {0}")]
    NotFound(String),

    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The filename cannot be stored under the upload directory.
    #[error("invalid filename: {0}")]
    InvalidFilename(#[from] FilenameError),

    /// The file exceeds the configured size limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    /// The stored bytes are not valid UTF-8 text.
    #[error("file is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}
