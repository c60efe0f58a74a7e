use std::sync::Arc;

use chrono::Duration;
use mongodb::Database;

use crate::auth::TokenIssuer;
use crate::config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
use crate::repository::memory::{MemoryProductRepository, MemoryTaskRepository, MemoryUserRepository};
use crate::repository::mongo::{MongoProductRepository, MongoTaskRepository, MongoUserRepository};
use crate::repository::{ProductRepository, TaskRepository, UserRepository};
use crate::storage::ImageStore;

/// Shared by every handler through `web::Data`.
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub images: Arc<dyn ImageStore>,
    pub tokens: TokenIssuer,
    pub environment: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn with_mongo(db: &Database, images: Arc<dyn ImageStore>, config: &Config) -> Self {
        AppState {
            users: Arc::new(MongoUserRepository::new(db)),
            tasks: Arc::new(MongoTaskRepository::new(db)),
            products: Arc::new(MongoProductRepository::new(db)),
            images,
            tokens: TokenIssuer::new(&config.jwt_secret, Duration::hours(config.jwt_expires_in_hours)),
            environment: config.environment.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Database-free state for tests and local demos.
    pub fn in_memory(images: Arc<dyn ImageStore>, tokens: TokenIssuer) -> Self {
        AppState {
            users: Arc::new(MemoryUserRepository::default()),
            tasks: Arc::new(MemoryTaskRepository::default()),
            products: Arc::new(MemoryProductRepository::default()),
            images,
            tokens,
            environment: "test".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
