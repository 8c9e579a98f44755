use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::error::StorageError;
use super::filename::validate_upload_filename;
use super::traits::FileStore;

/// Local-directory file store.
///
/// Files live flat under `base_path` with their original names. Writes go
/// through `{base_path}/.tmp` and are renamed into place, so readers never
/// observe a half-written file.
pub struct LocalFileStore {
    base_path: PathBuf,
    base_url: String,
    max_size: u64,
}

impl LocalFileStore {
    /// Create a new local file store, creating the directory if needed.
    pub async fn new(
        base_path: PathBuf,
        base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            base_url: base_url.into(),
            max_size,
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, filename: &str, data: &[u8]) -> Result<u64, StorageError> {
        let target = self.path(filename)?;

        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(filename, size, "Stored upload");
        Ok(size)
    }

    async fn get(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, filename: &str) -> Result<bool, StorageError> {
        let path = self.path(filename)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, filename: &str) -> Result<bool, StorageError> {
        let path = self.path(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn path(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let name = validate_upload_filename(filename)?;
        Ok(self.base_path.join(name))
    }

    fn url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), filename.trim())
    }
}
