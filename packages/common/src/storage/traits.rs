use std::path::PathBuf;

use async_trait::async_trait;

use super::error::StorageError;

/// Filename-addressed storage for uploaded documents.
///
/// Files keep the name they were uploaded with; storing a file under an
/// existing name replaces it.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `filename` and return the number of bytes written.
    async fn put(&self, filename: &str, data: &[u8]) -> Result<u64, StorageError>;

    /// Retrieve all bytes of a stored file.
    async fn get(&self, filename: &str) -> Result<Vec<u8>, StorageError>;

    /// Retrieve a stored file as UTF-8 text.
    async fn read_text(&self, filename: &str) -> Result<String, StorageError> {
        let bytes = self.get(filename).await?;
        String::from_utf8(bytes).map_err(|e| StorageError::InvalidUtf8(e.to_string()))
    }

    /// Check whether a file exists.
    async fn exists(&self, filename: &str) -> Result<bool, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, filename: &str) -> Result<bool, StorageError>;

    /// Resolve the stable on-disk location of `filename`.
    fn path(&self, filename: &str) -> Result<PathBuf, StorageError>;

    /// Public URL a client can fetch the file from.
    fn url(&self, filename: &str) -> String;
}
