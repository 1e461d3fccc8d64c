//! Temporary upload storage.
//!
//! Each analysis request stores its resume once and releases it once. `delete`
//! takes the handle by value so a released upload cannot be touched again.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to store uploaded resume: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to read uploaded resume: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to delete uploaded resume {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to one stored upload.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
pub trait UploadStorage: Send + Sync {
    async fn store(&self, bytes: &[u8]) -> Result<StoredUpload, StorageError>;

    async fn load(&self, upload: &StoredUpload) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, upload: StoredUpload) -> Result<(), StorageError>;
}

/// Stores uploads as `resume-<uuid>.upload` files under a single directory.
pub struct DiskUploadStorage {
    dir: PathBuf,
}

impl DiskUploadStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the upload directory if needed.
    pub async fn init(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage = Self::new(dir);
        tokio::fs::create_dir_all(&storage.dir)
            .await
            .map_err(StorageError::Write)?;
        Ok(storage)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl UploadStorage for DiskUploadStorage {
    async fn store(&self, bytes: &[u8]) -> Result<StoredUpload, StorageError> {
        let path = self.dir.join(format!("resume-{}.upload", Uuid::new_v4()));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(StorageError::Write)?;
        debug!("Stored upload ({} bytes) at {}", bytes.len(), path.display());
        Ok(StoredUpload { path })
    }

    async fn load(&self, upload: &StoredUpload) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(upload.path())
            .await
            .map_err(StorageError::Read)
    }

    async fn delete(&self, upload: StoredUpload) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&upload.path).await {
            Ok(()) => {
                debug!("Deleted upload {}", upload.path.display());
                Ok(())
            }
            Err(source) => Err(StorageError::Delete {
                path: upload.path,
                source,
            }),
        }
    }
}
