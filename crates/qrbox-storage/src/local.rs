use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{StorageError, StorageResult};

/// Local filesystem storage rooted at the upload directory.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the base directory if needed.
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "uploads")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:10000/uploads")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.contains('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Public URL for a stored file.
    pub fn url_for(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    /// Filesystem path for a stored file. The detection engine reads the
    /// raster straight from disk.
    pub fn path_for(&self, storage_key: &str) -> StorageResult<PathBuf> {
        self.key_to_path(storage_key)
    }

    /// Write a file under the base directory.
    pub async fn save(&self, storage_key: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored file"
        );

        Ok(path)
    }

    pub async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    /// Remove a file. Returns NotFound if it was already absent.
    pub async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Remove a file, logging and swallowing any failure. Used on the
    /// deletion path where a missing or locked file must not abort the
    /// database removal.
    pub async fn delete_best_effort(&self, storage_key: &str) {
        match self.delete(storage_key).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(key = %storage_key, "File already absent on delete");
            }
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Could not delete stored file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:10000/uploads".to_string())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn save_then_exists_then_delete() {
        let (_dir, storage) = storage().await;

        storage.save("a.png", b"data").await.unwrap();
        assert!(storage.exists("a.png").await.unwrap());

        storage.delete("a.png").await.unwrap();
        assert!(!storage.exists("a.png").await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.delete("missing.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_best_effort_never_errors() {
        let (_dir, storage) = storage().await;
        // Absent file: swallowed.
        storage.delete_best_effort("missing.png").await;
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.save("../evil.png", b"x").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.path_for("nested/evil.png"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.path_for(""), Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn url_for_joins_cleanly() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://host/uploads/".to_string())
            .await
            .unwrap();
        assert_eq!(storage.url_for("a.png"), "http://host/uploads/a.png");
    }
}
