//! Product Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductContent};
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All mirror products, oldest first
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self.base.db().select(id.clone()).await?;
        Ok(product)
    }

    /// Insert a new mirror record, returning it with its assigned id
    pub async fn create(&self, content: ProductContent) -> RepoResult<Product> {
        let created: Option<Product> = self.base.db().create(PRODUCT_TABLE).content(content).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Replace the mirrored fields of an existing record
    pub async fn update(&self, id: &RecordId, content: ProductContent) -> RepoResult<Product> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET name = $name, description = $description, price = $price, \
                 quantity = $quantity, category = $category RETURN AFTER",
            )
            .bind(("id", id.clone()))
            .bind(("name", content.name))
            .bind(("description", content.description))
            .bind(("price", content.price))
            .bind(("quantity", content.quantity))
            .bind(("category", content.category))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let deleted: Option<Product> = self.base.db().delete(id.clone()).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }
}
