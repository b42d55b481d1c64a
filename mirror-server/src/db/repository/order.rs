//! Order Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, OrderContent, OrderStatus};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY order_id")
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn find_by_order_id(&self, order_id: u64) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE order_id = $order_id LIMIT 1")
            .bind(("order_id", order_id))
            .await?
            .take(0)?;
        Ok(order)
    }

    pub async fn create(&self, content: OrderContent) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(content).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Set the status of the order with this ledger order id
    pub async fn update_status(&self, order_id: u64, status: OrderStatus) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query("UPDATE order SET status = $status WHERE order_id = $order_id RETURN AFTER")
            .bind(("order_id", order_id))
            .bind(("status", status))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))
    }

    /// Remove the mirror row for a ledger order id; no-op when absent
    pub async fn delete_by_order_id(&self, order_id: u64) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE order WHERE order_id = $order_id")
            .bind(("order_id", order_id))
            .await?;
        Ok(())
    }
}
