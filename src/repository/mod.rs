//! Persistence boundary for users, tasks and products.
//!
//! Handlers only ever talk to these traits. `mongo` backs them with MongoDB
//! collections, `memory` with plain maps for tests and local demos.

use async_trait::async_trait;

use crate::models::{NewProduct, NewTask, Product, ProductFilter, ProductPatch, Task, TaskPatch, User};

pub mod memory;
pub mod mongo;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique field collided; carries a human label for the field.
    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for RepoError {
    fn from(err: mongodb::error::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepoError>;
    /// Fails with `Duplicate` when the email is taken.
    async fn insert(&self, user: User) -> Result<User, RepoError>;
}

/// Every task operation is scoped to its owner; a task that exists but
/// belongs to someone else is reported exactly like a missing one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Task>, RepoError>;
    async fn create(&self, owner: &str, input: NewTask) -> Result<Task, RepoError>;
    async fn update(&self, owner: &str, id: &str, patch: TaskPatch) -> Result<Option<Task>, RepoError>;
    async fn delete(&self, owner: &str, id: &str) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Matching products ordered by id.
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepoError>;
    async fn create(&self, input: NewProduct) -> Result<Product, RepoError>;
    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, RepoError>;
    async fn delete(&self, id: &str) -> Result<bool, RepoError>;
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
