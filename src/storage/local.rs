//! Local filesystem storage implementation.
//!
//! Writes go to a temporary file first and are renamed into place, so a
//! crash mid-write leaves the previous set intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SeenSet;
use crate::storage::SeenStorage;

/// File name of the seen set inside the data directory.
pub const SEEN_KEY: &str = "seen_jobs.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SeenStorage for LocalStorage {
    async fn load_seen(&self) -> Result<SeenSet> {
        match self.read_json::<SeenSet>(SEEN_KEY).await? {
            Some(seen) => {
                log::debug!("Loaded {} seen postings", seen.len());
                Ok(seen)
            }
            None => {
                log::info!(
                    "No {} in {}, starting with an empty set",
                    SEEN_KEY,
                    self.root_dir.display()
                );
                Ok(SeenSet::new())
            }
        }
    }

    async fn save_seen(&self, seen: &SeenSet) -> Result<()> {
        self.write_json(SEEN_KEY, seen).await?;
        log::debug!("Saved {} seen postings", seen.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!tmp.path().join("test.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_missing_store_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("data"));

        assert!(storage.load_seen().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seen_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("data"));

        let seen: SeenSet = ["b2", "a1", "c3"].iter().map(|s| s.to_string()).collect();
        storage.save_seen(&seen).await.unwrap();

        let loaded = storage.load_seen().await.unwrap();
        assert_eq!(loaded, seen);

        // A later save replaces the whole set.
        let mut grown = loaded.clone();
        grown.insert("d4");
        storage.save_seen(&grown).await.unwrap();
        assert_eq!(storage.load_seen().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_reads_plain_identifier_array() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(SEEN_KEY), r#"["x","y"]"#).unwrap();
        let storage = LocalStorage::new(tmp.path());

        let seen = storage.load_seen().await.unwrap();
        assert!(seen.contains("x") && seen.contains("y"));
    }

    #[tokio::test]
    async fn test_corrupt_store_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(SEEN_KEY), "{oops").unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.load_seen().await.is_err());
    }
}
