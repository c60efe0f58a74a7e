use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

use crate::models::{Product, Task, User};

pub const USERS: &str = "users";
pub const TASKS: &str = "tasks";
pub const PRODUCTS: &str = "products";

pub async fn connect(database_url: &str, database_name: &str) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(database_url).await?;
    client_options.app_name = Some("task-hub".to_string());

    let client = Client::with_options(client_options)?;
    let db = client.database(database_name);
    ensure_indexes(&db).await?;
    log::info!("connected to MongoDB database {}", database_name);
    Ok(db)
}

async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let unique_email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<User>(USERS).create_index(unique_email, None).await?;

    db.collection::<Task>(TASKS)
        .create_index(IndexModel::builder().keys(doc! { "user": 1 }).build(), None)
        .await?;

    db.collection::<Product>(PRODUCTS)
        .create_indexes(product_indexes(), None)
        .await?;
    Ok(())
}

/// Plain ascending keys; name search is a `$regex`, which cannot use a text index.
fn product_indexes() -> Vec<IndexModel> {
    ["name", "category", "price"]
        .into_iter()
        .map(|field| {
            let mut keys = Document::new();
            keys.insert(field, 1);
            IndexModel::builder().keys(keys).build()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_indexes_are_ascending() {
        let keys: Vec<_> = product_indexes().into_iter().map(|index| index.keys).collect();
        assert_eq!(
            keys,
            vec![doc! { "name": 1 }, doc! { "category": 1 }, doc! { "price": 1 }]
        );
    }
}
