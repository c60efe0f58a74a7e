use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};

use super::{new_id, ProductRepository, RepoError, TaskRepository, UserRepository};
use crate::db;
use crate::models::{
    NewProduct, NewTask, Product, ProductFilter, ProductPatch, Task, TaskPatch, TaskStatus, User,
};
use serde::{Deserialize, Serialize};

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

/// Current time at the millisecond precision BSON dates keep.
fn now_millis() -> DateTime<Utc> {
    bson::DateTime::now().to_chrono()
}

fn now_bson() -> Bson {
    Bson::DateTime(bson::DateTime::now())
}

// Stored shapes. Timestamps are BSON dates so they sort and compare as time.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
    password: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<User> for UserDocument {
    fn from(user: User) -> Self {
        UserDocument {
            id: user.id,
            name: user.name,
            email: user.email,
            password: user.password,
            created_at: user.created_at,
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            password: doc.password,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDocument {
    #[serde(rename = "_id")]
    id: String,
    user: String,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<Task> for TaskDocument {
    fn from(task: Task) -> Self {
        TaskDocument {
            id: task.id,
            user: task.user,
            title: task.title,
            description: task.description,
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl From<TaskDocument> for Task {
    fn from(doc: TaskDocument) -> Self {
        Task {
            id: doc.id,
            user: doc.user,
            title: doc.title,
            description: doc.description,
            status: doc.status,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    price: f64,
    category: String,
    stock: i64,
    image_url: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDocument {
    fn from(product: Product) -> Self {
        ProductDocument {
            id: product.id,
            name: product.name,
            price: product.price,
            category: product.category,
            stock: product.stock,
            image_url: product.image_url,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        Product {
            id: doc.id,
            name: doc.name,
            price: doc.price,
            category: doc.category,
            stock: doc.stock,
            image_url: doc.image_url,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

/// Escapes regex metacharacters so search text matches literally.
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}-/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Translates a product filter into a MongoDB query document.
pub fn product_filter_document(filter: &ProductFilter) -> Document {
    let mut query = Document::new();
    if let Some(search) = &filter.search {
        query.insert("name", doc! { "$regex": escape_regex(search), "$options": "i" });
    }
    if let Some(category) = &filter.category {
        query.insert("category", category.clone());
    }
    let mut price = Document::new();
    if let Some(min) = filter.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = filter.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        query.insert("price", price);
    }
    query
}

pub struct MongoUserRepository {
    users: Collection<UserDocument>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        MongoUserRepository {
            users: db.collection(db::USERS),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let found = self.users.find_one(doc! { "email": email }, None).await?;
        Ok(found.map(User::from))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepoError> {
        let found = self.users.find_one(doc! { "_id": id }, None).await?;
        Ok(found.map(User::from))
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let stored = UserDocument::from(User {
            created_at: bson::DateTime::from_chrono(user.created_at).to_chrono(),
            ..user
        });
        match self.users.insert_one(&stored, None).await {
            Ok(_) => Ok(stored.into()),
            Err(e) if is_duplicate_key(&e) => Err(RepoError::Duplicate("User".to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct MongoTaskRepository {
    tasks: Collection<TaskDocument>,
}

impl MongoTaskRepository {
    pub fn new(db: &Database) -> Self {
        MongoTaskRepository {
            tasks: db.collection(db::TASKS),
        }
    }
}

#[async_trait]
impl TaskRepository for MongoTaskRepository {
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Task>, RepoError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": 1, "_id": 1 })
            .build();
        let cursor = self.tasks.find(doc! { "user": owner }, options).await?;
        let docs: Vec<TaskDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Task::from).collect())
    }

    async fn create(&self, owner: &str, input: NewTask) -> Result<Task, RepoError> {
        let now = now_millis();
        let task = TaskDocument {
            id: new_id(),
            user: owner.to_string(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert_one(&task, None).await?;
        Ok(task.into())
    }

    async fn update(&self, owner: &str, id: &str, patch: TaskPatch) -> Result<Option<Task>, RepoError> {
        let mut set = doc! { "updatedAt": now_bson() };
        if let Some(title) = patch.title {
            set.insert("title", title);
        }
        if let Some(description) = patch.description {
            set.insert("description", description);
        }
        if let Some(status) = patch.status {
            set.insert("status", status.as_str());
        }

        let filter = doc! { "_id": id, "user": owner };
        let updated = self
            .tasks
            .find_one_and_update(filter, doc! { "$set": set }, return_updated())
            .await?;
        Ok(updated.map(Task::from))
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<bool, RepoError> {
        let result = self.tasks.delete_one(doc! { "_id": id, "user": owner }, None).await?;
        Ok(result.deleted_count == 1)
    }
}

pub struct MongoProductRepository {
    products: Collection<ProductDocument>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        MongoProductRepository {
            products: db.collection(db::PRODUCTS),
        }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepoError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self
            .products
            .find(product_filter_document(filter), options)
            .await?;
        let docs: Vec<ProductDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Product::from).collect())
    }

    async fn create(&self, input: NewProduct) -> Result<Product, RepoError> {
        let now = now_millis();
        let product = ProductDocument {
            id: new_id(),
            name: input.name,
            price: input.price,
            category: input.category,
            stock: input.stock,
            image_url: input.image_url,
            created_at: now,
            updated_at: now,
        };
        self.products.insert_one(&product, None).await?;
        Ok(product.into())
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, RepoError> {
        let mut set = doc! { "updatedAt": now_bson() };
        if let Some(name) = patch.name {
            set.insert("name", name);
        }
        if let Some(price) = patch.price {
            set.insert("price", price);
        }
        if let Some(category) = patch.category {
            set.insert("category", category);
        }
        if let Some(stock) = patch.stock {
            set.insert("stock", stock);
        }
        if let Some(image_url) = patch.image_url {
            set.insert("imageUrl", image_url);
        }

        let updated = self
            .products
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, return_updated())
            .await?;
        Ok(updated.map(Product::from))
    }

    async fn delete(&self, id: &str) -> Result<bool, RepoError> {
        let result = self.products.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }
}
