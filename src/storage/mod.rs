//! Image storage: a remote S3 bucket or a local upload directory.
//!
//! Exactly one backend is active per process, picked by [`from_config`].

use std::path::Path;
use std::sync::Arc;

use actix_web::web::Bytes;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::models::StoredImage;

mod local;
mod remote;

pub use local::LocalDiskStore;
pub use remote::RemoteObjectStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    Remote(String),
}

/// One uploaded file, already read and size-checked.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, upload: ImageUpload) -> Result<StoredImage, StorageError>;
    async fn list(&self) -> Result<Vec<StoredImage>, StorageError>;
    /// Missing keys fail with `NotFound` on every backend.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Directory served at `/uploads`, if this backend writes to local disk.
    fn local_dir(&self) -> Option<&Path> {
        None
    }
}

pub async fn from_config(config: &StorageConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    match config {
        StorageConfig::Remote { bucket, region } => {
            log::info!("image storage: s3 bucket {} in {}", bucket, region);
            Ok(Arc::new(RemoteObjectStore::connect(bucket, region).await))
        }
        StorageConfig::Local {
            dir,
            public_base_url,
        } => {
            log::info!("image storage: local directory {}", dir.display());
            let store = LocalDiskStore::new(dir, public_base_url);
            store.ensure_dir().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Time-ordered, collision-resistant stem: `<unix millis>-<uuid v4>`.
pub fn unique_stem() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4())
}

/// Replaces everything outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Lower-cased alphanumeric extension of the original filename, if any.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}
