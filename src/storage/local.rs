use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{sanitize_filename, unique_stem, ImageStore, ImageUpload, StorageError};
use crate::models::StoredImage;

/// Stores images as flat files under one directory, served back at `/uploads`.
pub struct LocalDiskStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalDiskStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        LocalDiskStore {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        if tokio::fs::metadata(&self.dir).await.is_err() {
            tokio::fs::create_dir_all(&self.dir).await?;
            log::info!("created uploads directory at {}", self.dir.display());
        }
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, key)
    }

    /// Resolves a key to a path inside the upload directory, refusing anything
    /// that could step outside it.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl ImageStore for LocalDiskStore {
    async fn put(&self, upload: ImageUpload) -> Result<StoredImage, StorageError> {
        self.ensure_dir().await?;
        let key = format!("{}-{}", unique_stem(), sanitize_filename(&upload.original_name));
        let path = self.path_for(&key)?;
        tokio::fs::write(&path, &upload.bytes).await?;
        log::debug!("stored {} ({} bytes)", path.display(), upload.bytes.len());
        Ok(StoredImage {
            url: self.url_for(&key),
            filename: key,
        })
    }

    async fn list(&self) -> Result<Vec<StoredImage>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                images.push(StoredImage {
                    filename: name.to_string(),
                    url: self.url_for(name),
                });
            }
        }
        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(images)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn local_dir(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}
