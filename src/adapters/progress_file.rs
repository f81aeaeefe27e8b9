//! JSON-file implementation of the ProgressStore.
//!
//! The checkpoint is `{"last_index": N}`. Writes go to a sibling temp file
//! which is fsynced and renamed over the checkpoint, so a crash leaves
//! either the old or the new value on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::IngestionProgress;
use crate::domain::ports::ProgressStore;

/// `ProgressStore` backed by one JSON file.
///
/// A missing file loads as offset 0.
#[derive(Debug, Clone)]
pub struct JsonProgressStore {
    path: PathBuf,
}

impl JsonProgressStore {
    /// Store the checkpoint at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "progress.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProgressStore for JsonProgressStore {
    async fn load(&self) -> DomainResult<IngestionProgress> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IngestionProgress::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, progress: &IngestionProgress) -> DomainResult<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);

        if let Some(dir) = &parent {
            tokio::fs::create_dir_all(dir).await?;
        }

        let body = serde_json::to_vec(progress)?;
        let tmp = self.temp_path();

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;

        // Persist the rename itself. Directories cannot be opened for sync on
        // every platform.
        let dir = parent.unwrap_or_else(|| PathBuf::from("."));
        match tokio::fs::File::open(&dir).await {
            Ok(handle) => {
                if let Err(e) = handle.sync_all().await {
                    warn!(dir = %dir.display(), error = %e, "Failed to sync checkpoint directory");
                }
            }
            Err(e) => debug!(dir = %dir.display(), error = %e, "Checkpoint directory not syncable"),
        }

        debug!(path = %self.path.display(), last_index = progress.last_index, "Saved ingestion progress");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProgressStore::new(dir.path().join("progress.json"));
        assert_eq!(store.load().await.unwrap().last_index, 0);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProgressStore::new(dir.path().join("state").join("progress.json"));

        store.save(&IngestionProgress::new(42)).await.unwrap();

        assert_eq!(store.load().await.unwrap().last_index, 42);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let store = JsonProgressStore::new(&path);

        store.save(&IngestionProgress::new(7)).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({"last_index": 7}));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonProgressStore::new(&path);
        assert!(store.load().await.is_err());
    }
}
