//! Stored item images
//!
//! Writes uploaded image bytes under uuid filenames in the configured
//! upload directory and removes them again when their item (or the whole
//! category) goes away. Removal always happens after the database commit,
//! so a crash can orphan a file but never leave a row pointing at a missing
//! image it was supposed to keep.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// On-disk store for uploaded item images
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at the upload directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The upload directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save image bytes under a fresh uuid filename, returning the stored
    /// filename.
    pub async fn save(&self, data: &[u8], mime_type: &str) -> Result<String> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)
                .await
                .with_context(|| format!("Failed to create upload dir: {:?}", self.root))?;
        }

        let filename = format!("{}.{}", Uuid::new_v4(), extension_for(mime_type));
        let path = self.root.join(&filename);

        fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to save image: {:?}", path))?;

        Ok(filename)
    }

    /// Remove a stored image. Missing files are not an error: the row is
    /// already gone, the file is merely ahead of schedule.
    pub async fn remove(&self, filename: &str) -> Result<()> {
        let path = self.root.join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove image: {:?}", path)),
        }
    }

    /// Remove a batch of stored images, logging failures instead of
    /// aborting; used by the category cascade cleanup.
    pub async fn remove_all(&self, filenames: &[String]) {
        for filename in filenames {
            if let Err(e) = self.remove(filename).await {
                tracing::warn!("Failed to remove image {}: {}", filename, e);
            }
        }
    }
}

/// File extension for a MIME type
fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let filename = store.save(b"png bytes", "image/png").await.unwrap();
        assert!(filename.ends_with(".png"));
        assert!(dir.path().join(&filename).exists());

        store.remove(&filename).await.unwrap();
        assert!(!dir.path().join(&filename).exists());
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        let store = ImageStore::new(&nested);

        let filename = store.save(b"data", "image/jpeg").await.unwrap();

        assert!(nested.join(&filename).exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        store.remove("does-not-exist.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_all_continues_past_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let a = store.save(b"a", "image/png").await.unwrap();
        let b = store.save(b"b", "image/png").await.unwrap();

        store
            .remove_all(&["missing.png".to_string(), a.clone(), b.clone()])
            .await;

        assert!(!dir.path().join(a).exists());
        assert!(!dir.path().join(b).exists());
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }
}
