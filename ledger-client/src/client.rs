//! The `Ledger` trait - contract surface of the external supply ledger

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::LedgerResult;
use crate::types::{AccountId, LedgerEvent, LedgerTx, OrderRecord, ProductRecord, Receipt};

/// Opaque handle to the external supply ledger.
///
/// The ledger is append-only and authoritative: once `submit` confirms a
/// transaction it is final, and no caller may roll it back. Counts are
/// monotonic (they include deleted records), so `get_product(i)` for
/// `1..=product_count()` can return `NotFound` for deleted slots.
///
/// # Contract for mutating calls
///
/// Callers must `estimate_gas` first and submit with
/// [`apply_gas_margin`](crate::types::apply_gas_margin) applied. A
/// `Reverted` error means the transaction had no effect.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Accounts available for signing transactions. Account 0 is the
    /// contract owner.
    async fn accounts(&self) -> LedgerResult<Vec<AccountId>>;

    /// Total products ever added (monotonic, includes deleted)
    async fn product_count(&self) -> LedgerResult<u64>;

    /// Read a product by its ledger-assigned ID (1-based)
    async fn get_product(&self, id: u64) -> LedgerResult<ProductRecord>;

    /// Total orders ever placed (monotonic, includes deleted)
    async fn order_count(&self) -> LedgerResult<u64>;

    /// Read an order by its ledger-assigned ID (1-based)
    async fn get_order(&self, id: u64) -> LedgerResult<OrderRecord>;

    /// Estimate the gas cost of a transaction without executing it
    async fn estimate_gas(&self, tx: &LedgerTx, from: &AccountId) -> LedgerResult<u64>;

    /// Submit a transaction and await its confirmation receipt
    async fn submit(&self, tx: LedgerTx, from: &AccountId, gas_limit: u64)
    -> LedgerResult<Receipt>;

    /// Subscribe to the ledger's event stream.
    ///
    /// Long-lived and independent of request-driven calls; delivery is
    /// at-least-once with no ordering guarantee relative to in-flight
    /// submissions.
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent>;
}
