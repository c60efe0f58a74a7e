use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{new_id, ProductRepository, RepoError, TaskRepository, UserRepository};
use crate::models::{NewProduct, NewTask, Product, ProductFilter, ProductPatch, Task, TaskPatch, User};

fn guard<T>(lock: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepoError> {
    lock.lock()
        .map_err(|_| RepoError::Database("in-memory store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<BTreeMap<String, User>>, // keyed by id
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = guard(&self.users)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepoError> {
        Ok(guard(&self.users)?.get(id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = guard(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Duplicate("User".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryTaskRepository {
    tasks: Mutex<BTreeMap<String, Task>>,
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Task>, RepoError> {
        let tasks = guard(&self.tasks)?;
        let mut owned: Vec<Task> = tasks.values().filter(|t| t.user == owner).cloned().collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn create(&self, owner: &str, input: NewTask) -> Result<Task, RepoError> {
        let now = Utc::now();
        let task = Task {
            id: new_id(),
            user: owner.to_string(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        guard(&self.tasks)?.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn update(&self, owner: &str, id: &str, patch: TaskPatch) -> Result<Option<Task>, RepoError> {
        let mut tasks = guard(&self.tasks)?;
        let task = match tasks.get_mut(id) {
            Some(task) if task.user == owner => task,
            _ => return Ok(None),
        };
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<bool, RepoError> {
        let mut tasks = guard(&self.tasks)?;
        match tasks.get(id) {
            Some(task) if task.user == owner => {
                tasks.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryProductRepository {
    products: Mutex<BTreeMap<String, Product>>,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepoError> {
        let products = guard(&self.products)?;
        Ok(products.values().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn create(&self, input: NewProduct) -> Result<Product, RepoError> {
        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name: input.name,
            price: input.price,
            category: input.category,
            stock: input.stock,
            image_url: input.image_url,
            created_at: now,
            updated_at: now,
        };
        guard(&self.products)?.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, RepoError> {
        let mut products = guard(&self.products)?;
        let Some(product) = products.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = Some(image_url);
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, RepoError> {
        Ok(guard(&self.products)?.remove(id).is_some())
    }
}
