//! Sync coordinator - ledger-first mutation flows
//!
//! Every mutation follows the same contract:
//!
//! 1. optional ledger existence check (fail fast, no gas spent)
//! 2. estimate gas, submit with the fixed 20% margin applied
//! 3. ledger confirmation is the point of no return
//! 4. derive the assigned id from the receipt, then write mirror + mapping
//!
//! A mirror or mapping failure after step 3 surfaces as
//! [`SyncError::MirrorWrite`] and is never rolled back: the ledger stays
//! canonical and the mirror is known-stale until re-synced.
//!
//! 产品的增删改以 ledger id 为键；下单按产品名称解析(与账本合约一致)。
//! 同名产品在下单路径上会命中第一个匹配项。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use ledger_client::{
    AccountId, Ledger, LedgerError, LedgerEvent, LedgerResult, LedgerTx, ProductRecord, Receipt,
    apply_gas_margin,
};
use shared::catalog::{CreateProductRequest, UpdateProductRequest};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{Order, OrderContent, OrderStatus, Product, ProductContent};
use crate::db::repository::{
    CounterRepository, MappingRepository, OrderRepository, ProductRepository, RepoError,
};
use crate::sync::appliers;
use crate::sync::{MirrorMutation, ProductFields, SyncError, SyncResult};

/// Name of the vestigial product sequence.
///
/// Incremented on every create for parity with historical data, but the
/// id-mapping key always comes from the confirmation receipt.
const PRODUCT_COUNTER: &str = "product";

/// Coordinates the authoritative ledger and the mirror store
#[derive(Clone)]
pub struct SyncCoordinator {
    ledger: Arc<dyn Ledger>,
    products: ProductRepository,
    orders: OrderRepository,
    mappings: MappingRepository,
    counters: CounterRepository,
    ledger_timeout: Duration,
}

impl SyncCoordinator {
    pub fn new(ledger: Arc<dyn Ledger>, db: Surreal<Db>, ledger_timeout: Duration) -> Self {
        Self {
            ledger,
            products: ProductRepository::new(db.clone()),
            orders: OrderRepository::new(db.clone()),
            mappings: MappingRepository::new(db.clone()),
            counters: CounterRepository::new(db),
            ledger_timeout,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Run a ledger call under the configured timeout.
    /// A hung gateway becomes `Unavailable` instead of blocking forever.
    async fn call<T>(&self, fut: impl Future<Output = LedgerResult<T>>) -> LedgerResult<T> {
        match tokio::time::timeout(self.ledger_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Unavailable(format!(
                "Ledger call timed out after {}ms",
                self.ledger_timeout.as_millis()
            ))),
        }
    }

    /// Account 0 signs administrative mutations (contract owner)
    async fn operator_account(&self) -> SyncResult<AccountId> {
        let accounts = self.call(self.ledger.accounts()).await?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::Ledger(LedgerError::Gateway("No ledger accounts".into())))
    }

    /// Estimate, apply the 20% margin, submit, await confirmation
    async fn estimate_and_submit(&self, tx: LedgerTx, from: &AccountId) -> SyncResult<Receipt> {
        let estimate = self.call(self.ledger.estimate_gas(&tx, from)).await?;
        let gas_limit = apply_gas_margin(estimate);
        let method = tx.method();
        let receipt = self.call(self.ledger.submit(tx, from, gas_limit)).await?;
        info!(
            method,
            estimate,
            gas_limit,
            gas_used = receipt.gas_used,
            "Ledger transaction confirmed"
        );
        Ok(receipt)
    }

    // =========================================================================
    // Product mutations
    // =========================================================================

    /// Create a product on the ledger, then mirror it.
    /// Returns the ledger-assigned id together with the mirror record.
    pub async fn create_product(&self, req: CreateProductRequest) -> SyncResult<(u64, Product)> {
        // Local sequence first: a store failure here costs no gas.
        let seq = self.counters.next(PRODUCT_COUNTER).await?;

        let from = self.operator_account().await?;
        let receipt = self
            .estimate_and_submit(
                LedgerTx::AddProduct {
                    name: req.name.clone(),
                    description: req.description.clone(),
                    price: req.price,
                    quantity: req.quantity,
                    category: req.category.clone(),
                },
                &from,
            )
            .await?;

        // Point of no return: the ledger row exists whatever happens below.
        let ledger_id = receipt
            .assigned_product_id()
            .ok_or(SyncError::ReceiptMissingId)?;

        let product = self
            .products
            .create(ProductContent::new(
                req.name,
                req.description,
                req.price,
                req.quantity,
                req.category,
            ))
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("product insert: {e}")))?;

        let mirror_id = product
            .id
            .clone()
            .ok_or_else(|| SyncError::MirrorWrite("mirror record missing id".into()))?;

        self.mappings
            .insert(ledger_id, mirror_id)
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("mapping insert: {e}")))?;

        info!(ledger_id, seq, name = %product.name, "Product created and mirrored");
        Ok((ledger_id, product))
    }

    /// Update a product everywhere, keyed by its ledger id
    pub async fn update_product(
        &self,
        ledger_id: u64,
        req: UpdateProductRequest,
    ) -> SyncResult<Product> {
        // Existence check before spending gas; deleted slots are NotFound.
        self.call(self.ledger.get_product(ledger_id)).await?;

        let from = self.operator_account().await?;
        self.estimate_and_submit(
            LedgerTx::UpdateProduct {
                id: ledger_id,
                name: req.name.clone(),
                description: req.description.clone(),
                price: req.price,
                quantity: req.quantity,
                category: req.category.clone(),
            },
            &from,
        )
        .await?;

        let mapping = self
            .mappings
            .find_by_ledger_id(ledger_id)
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("mapping lookup: {e}")))?;
        let Some(mapping) = mapping else {
            warn!(ledger_id, "Ledger update confirmed but no mapping row exists");
            return Err(SyncError::MappingMiss { ledger_id });
        };

        let product = self
            .products
            .update(
                &mapping.mirror_id,
                ProductContent::new(req.name, req.description, req.price, req.quantity, req.category),
            )
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("product update: {e}")))?;

        info!(ledger_id, mirror_id = %mapping.mirror_id, "Product updated on both sides");
        Ok(product)
    }

    /// Delete a product from the ledger, the mirror, and the mapping.
    ///
    /// The ledger keeps a dead slot (counts stay monotonic); mirror row and
    /// mapping row are removed in the same step.
    pub async fn delete_product(&self, ledger_id: u64) -> SyncResult<()> {
        self.call(self.ledger.get_product(ledger_id)).await?;

        let from = self.operator_account().await?;
        self.estimate_and_submit(LedgerTx::DeleteProduct { id: ledger_id }, &from)
            .await?;

        // Mapping resolution happens after the confirmed delete; a miss is
        // a real inconsistency, not a silent no-op.
        let mapping = self
            .mappings
            .find_by_ledger_id(ledger_id)
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("mapping lookup: {e}")))?;
        let Some(mapping) = mapping else {
            warn!(ledger_id, "Ledger delete confirmed but no mapping row exists");
            return Err(SyncError::MappingMiss { ledger_id });
        };

        if let Err(e) = self.products.delete(&mapping.mirror_id).await {
            // Row already gone is tolerable; other failures are not.
            if !matches!(e, RepoError::NotFound(_)) {
                return Err(SyncError::MirrorWrite(format!("product delete: {e}")));
            }
        }
        self.mappings
            .delete_by_ledger_id(ledger_id)
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("mapping delete: {e}")))?;

        info!(ledger_id, mirror_id = %mapping.mirror_id, "Product deleted everywhere");
        Ok(())
    }

    // =========================================================================
    // Order mutations
    // =========================================================================

    /// Resolve a product by name over the live ledger (first match wins).
    /// Deleted slots are skipped; counts include them.
    pub async fn resolve_product_by_name(
        &self,
        name: &str,
    ) -> SyncResult<(u64, ProductRecord)> {
        let count = self.call(self.ledger.product_count()).await?;
        for id in 1..=count {
            match self.call(self.ledger.get_product(id)).await {
                Ok(record) if record.name == name => return Ok((id, record)),
                Ok(_) => continue,
                Err(LedgerError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(SyncError::Ledger(LedgerError::NotFound(format!(
            "Product '{name}' not found on ledger"
        ))))
    }

    /// Place an order by product name, signed by the buyer's account.
    /// The ledger decrements stock; the mirror gains a pending order row.
    pub async fn place_order(
        &self,
        product_name: &str,
        quantity: u64,
        buyer: &AccountId,
    ) -> SyncResult<Order> {
        let (product_id, record) = self.resolve_product_by_name(product_name).await?;

        // Insufficient stock reverts here, leaving both sides untouched.
        let receipt = self
            .estimate_and_submit(
                LedgerTx::PlaceOrder {
                    product_id,
                    quantity,
                },
                buyer,
            )
            .await?;

        let order_id = receipt
            .assigned_order_id()
            .ok_or(SyncError::ReceiptMissingId)?;

        let order = self
            .orders
            .create(OrderContent {
                order_id,
                product_name: record.name,
                quantity,
                buyer: buyer.clone(),
                status: OrderStatus::Pending,
            })
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("order insert: {e}")))?;

        info!(order_id, product_id, quantity, "Order placed and mirrored");
        Ok(order)
    }

    /// Mark an order fulfilled on the ledger, then in the mirror
    pub async fn fulfill_order(&self, order_id: u64) -> SyncResult<Order> {
        self.call(self.ledger.get_order(order_id)).await?;

        let from = self.operator_account().await?;
        self.estimate_and_submit(LedgerTx::FulfillOrder { order_id }, &from)
            .await?;

        let order = self
            .orders
            .update_status(order_id, OrderStatus::Fulfilled)
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("order status update: {e}")))?;

        info!(order_id, "Order fulfilled on both sides");
        Ok(order)
    }

    /// Delete an order from the ledger and drop its mirror row
    pub async fn delete_order(&self, order_id: u64) -> SyncResult<()> {
        self.call(self.ledger.get_order(order_id)).await?;

        let from = self.operator_account().await?;
        self.estimate_and_submit(LedgerTx::DeleteOrder { order_id }, &from)
            .await?;

        self.orders
            .delete_by_order_id(order_id)
            .await
            .map_err(|e| SyncError::MirrorWrite(format!("order delete: {e}")))?;

        info!(order_id, "Order deleted everywhere");
        Ok(())
    }

    // =========================================================================
    // Event application (idempotent, replay-tolerant)
    // =========================================================================

    /// Apply one ledger event to the mirror.
    ///
    /// Events are delivered at-least-once and may describe work this
    /// process already did on the request path, so every branch upserts.
    pub async fn apply_event(&self, event: &LedgerEvent) -> SyncResult<()> {
        match appliers::plan_for(event) {
            Some(mutation) => self.apply_mutation(mutation).await,
            None => Ok(()),
        }
    }

    /// Execute a planned mirror mutation, keyed on ledger ids
    pub async fn apply_mutation(&self, mutation: MirrorMutation) -> SyncResult<()> {
        match mutation {
            MirrorMutation::UpsertProduct { ledger_id, fields } => {
                self.upsert_product(ledger_id, fields).await
            }
            MirrorMutation::RemoveProduct { ledger_id } => {
                self.remove_product(ledger_id).await
            }
            MirrorMutation::UpsertOrder {
                order_id,
                product_name,
                quantity,
                buyer,
            } => {
                if self.orders.find_by_order_id(order_id).await?.is_none() {
                    self.orders
                        .create(OrderContent {
                            order_id,
                            product_name,
                            quantity,
                            buyer,
                            status: OrderStatus::Pending,
                        })
                        .await?;
                    info!(order_id, "Order mirrored from event");
                }
                Ok(())
            }
            MirrorMutation::MarkOrderFulfilled { order_id } => {
                match self.orders.update_status(order_id, OrderStatus::Fulfilled).await {
                    Ok(_) => Ok(()),
                    // The placement event may not have been processed yet.
                    Err(RepoError::NotFound(_)) => {
                        warn!(order_id, "Fulfillment event for unmirrored order, skipped");
                        Ok(())
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn upsert_product(&self, ledger_id: u64, fields: ProductFields) -> SyncResult<()> {
        let content = ProductContent::new(
            fields.name,
            fields.description,
            fields.price,
            fields.quantity,
            fields.category,
        );

        match self.mappings.find_by_ledger_id(ledger_id).await? {
            Some(mapping) => {
                match self.products.update(&mapping.mirror_id, content.clone()).await {
                    Ok(_) => Ok(()),
                    Err(RepoError::NotFound(_)) => {
                        // Mapped row vanished; recreate and remap.
                        warn!(ledger_id, "Mapped mirror row missing, recreating");
                        self.mappings.delete_by_ledger_id(ledger_id).await?;
                        self.create_mirror_with_mapping(ledger_id, content).await
                    }
                    Err(e) => Err(e.into()),
                }
            }
            None => self.create_mirror_with_mapping(ledger_id, content).await,
        }
    }

    async fn create_mirror_with_mapping(
        &self,
        ledger_id: u64,
        content: ProductContent,
    ) -> SyncResult<()> {
        let product = self.products.create(content).await?;
        let mirror_id = product
            .id
            .ok_or_else(|| RepoError::Database("mirror record missing id".into()))?;
        self.mappings.insert(ledger_id, mirror_id).await?;
        info!(ledger_id, "Product mirrored from event");
        Ok(())
    }

    async fn remove_product(&self, ledger_id: u64) -> SyncResult<()> {
        match self.mappings.find_by_ledger_id(ledger_id).await? {
            Some(mapping) => {
                if let Err(e) = self.products.delete(&mapping.mirror_id).await {
                    if !matches!(e, RepoError::NotFound(_)) {
                        return Err(e.into());
                    }
                }
                self.mappings.delete_by_ledger_id(ledger_id).await?;
                info!(ledger_id, "Product removed from mirror by event");
                Ok(())
            }
            // Replay of a delete this process already applied.
            None => Ok(()),
        }
    }

    // =========================================================================
    // Read paths (ledger-authoritative)
    // =========================================================================

    /// Live products straight from the ledger, with mirror ids attached
    /// where a mapping exists
    pub async fn list_products(&self) -> SyncResult<Vec<(u64, ProductRecord, Option<String>)>> {
        let count = self.call(self.ledger.product_count()).await?;
        let mut out = Vec::new();
        for id in 1..=count {
            match self.call(self.ledger.get_product(id)).await {
                Ok(record) => {
                    let mirror_id = self
                        .mappings
                        .find_by_ledger_id(id)
                        .await?
                        .map(|m| m.mirror_id.to_string());
                    out.push((id, record, mirror_id));
                }
                Err(LedgerError::NotFound(_)) => continue, // deleted slot
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }

    /// One product by ledger id, with its mirror id when mapped
    pub async fn get_product(
        &self,
        ledger_id: u64,
    ) -> SyncResult<(ProductRecord, Option<String>)> {
        let record = self.call(self.ledger.get_product(ledger_id)).await?;
        let mirror_id = self
            .mappings
            .find_by_ledger_id(ledger_id)
            .await?
            .map(|m| m.mirror_id.to_string());
        Ok((record, mirror_id))
    }

    /// All mirrored orders
    pub async fn list_orders(&self) -> SyncResult<Vec<Order>> {
        Ok(self.orders.find_all().await?)
    }

    /// One mirrored order by its ledger order id
    pub async fn get_order(&self, order_id: u64) -> SyncResult<Option<Order>> {
        Ok(self.orders.find_by_order_id(order_id).await?)
    }
}
