//! In-process ledger with full contract semantics
//!
//! Stands in for the real chain in tests and local development. Behavior
//! matches the deployed contract:
//!
//! - IDs are assigned from 1 in submission order
//! - counts are monotonic: deleting a record does not decrement them
//! - reads of deleted slots fail ("Product does not exist")
//! - `placeOrder` checks stock and decrements the product quantity
//! - every mutation emits its event both in the receipt and on the
//!   subscription stream

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::client::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountId, LedgerEvent, LedgerTx, OrderRecord, ProductRecord, Receipt};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Flat per-method gas costs; enough to exercise the estimate/margin path
const GAS_BASE: u64 = 21_000;
const GAS_WRITE: u64 = 20_000;

struct Inner {
    accounts: Vec<AccountId>,
    /// Slot `i` holds product id `i + 1`; `None` marks a deleted product
    products: Vec<Option<ProductRecord>>,
    /// Slot `i` holds order id `i + 1`; `None` marks a deleted order
    orders: Vec<Option<OrderRecord>>,
    /// Fault injection: next submit reverts with this reason
    revert_next: Option<String>,
}

/// In-memory [`Ledger`] implementation
pub struct MemoryLedger {
    inner: Mutex<Inner>,
    events_tx: broadcast::Sender<LedgerEvent>,
}

impl MemoryLedger {
    /// Create a ledger with `account_count` pre-funded accounts.
    /// Account 0 is the contract owner.
    pub fn new(account_count: usize) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let accounts = (0..account_count)
            .map(|i| format!("0x{i:040x}"))
            .collect();
        Self {
            inner: Mutex::new(Inner {
                accounts,
                products: Vec::new(),
                orders: Vec::new(),
                revert_next: None,
            }),
            events_tx,
        }
    }

    /// Force the next `submit` to revert with the given reason.
    ///
    /// Test hook for exercising the no-mirror-write-after-revert rule.
    pub fn inject_revert(&self, reason: impl Into<String>) {
        self.inner.lock().expect("ledger lock").revert_next = Some(reason.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("ledger lock")
    }

    /// Cost of a transaction, also performing the validation the real
    /// node does during `estimateGas` (a tx that would revert fails here).
    fn cost_of(inner: &Inner, tx: &LedgerTx) -> LedgerResult<u64> {
        Self::validate(inner, tx)?;
        let payload: u64 = match tx {
            LedgerTx::AddProduct { name, .. } | LedgerTx::UpdateProduct { name, .. } => {
                GAS_WRITE + name.len() as u64 * 16
            }
            LedgerTx::DeleteProduct { .. } | LedgerTx::DeleteOrder { .. } => GAS_WRITE / 2,
            LedgerTx::PlaceOrder { .. } => GAS_WRITE,
            LedgerTx::FulfillOrder { .. } => GAS_WRITE / 4,
        };
        Ok(GAS_BASE + payload)
    }

    fn product_slot<'a>(
        inner: &'a Inner,
        id: u64,
    ) -> LedgerResult<&'a ProductRecord> {
        let idx = id
            .checked_sub(1)
            .ok_or_else(|| LedgerError::NotFound("Product does not exist".into()))?;
        inner
            .products
            .get(idx as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| LedgerError::NotFound("Product does not exist".into()))
    }

    fn order_slot<'a>(inner: &'a Inner, id: u64) -> LedgerResult<&'a OrderRecord> {
        let idx = id
            .checked_sub(1)
            .ok_or_else(|| LedgerError::NotFound("Order does not exist".into()))?;
        inner
            .orders
            .get(idx as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| LedgerError::NotFound("Order does not exist".into()))
    }

    fn validate(inner: &Inner, tx: &LedgerTx) -> LedgerResult<()> {
        match tx {
            LedgerTx::AddProduct { .. } => Ok(()),
            LedgerTx::UpdateProduct { id, .. } | LedgerTx::DeleteProduct { id } => {
                Self::product_slot(inner, *id)
                    .map(|_| ())
                    .map_err(|_| LedgerError::Reverted("Product does not exist".into()))
            }
            LedgerTx::PlaceOrder {
                product_id,
                quantity,
            } => {
                let product = Self::product_slot(inner, *product_id)
                    .map_err(|_| LedgerError::Reverted("Product does not exist".into()))?;
                if product.quantity < *quantity {
                    return Err(LedgerError::Reverted("Insufficient quantity".into()));
                }
                Ok(())
            }
            LedgerTx::FulfillOrder { order_id } | LedgerTx::DeleteOrder { order_id } => {
                Self::order_slot(inner, *order_id)
                    .map(|_| ())
                    .map_err(|_| LedgerError::Reverted("Order does not exist".into()))
            }
        }
    }

    /// Apply a validated transaction, returning the emitted events
    fn apply(inner: &mut Inner, tx: LedgerTx, from: &AccountId) -> Vec<LedgerEvent> {
        match tx {
            LedgerTx::AddProduct {
                name,
                description,
                price,
                quantity,
                category,
            } => {
                inner.products.push(Some(ProductRecord {
                    name: name.clone(),
                    description: description.clone(),
                    price,
                    quantity,
                    category: category.clone(),
                }));
                let id = inner.products.len() as u64;
                vec![LedgerEvent::ProductAdded {
                    id,
                    name,
                    description,
                    price,
                    quantity,
                    category,
                }]
            }
            LedgerTx::UpdateProduct {
                id,
                name,
                description,
                price,
                quantity,
                category,
            } => {
                inner.products[(id - 1) as usize] = Some(ProductRecord {
                    name: name.clone(),
                    description: description.clone(),
                    price,
                    quantity,
                    category: category.clone(),
                });
                vec![LedgerEvent::ProductUpdated {
                    id,
                    name,
                    description,
                    price,
                    quantity,
                    category,
                }]
            }
            LedgerTx::DeleteProduct { id } => {
                inner.products[(id - 1) as usize] = None;
                vec![LedgerEvent::ProductDeleted { id }]
            }
            LedgerTx::PlaceOrder {
                product_id,
                quantity,
            } => {
                let slot = inner.products[(product_id - 1) as usize]
                    .as_mut()
                    .expect("validated above");
                slot.quantity -= quantity;
                let product_name = slot.name.clone();
                inner.orders.push(Some(OrderRecord {
                    product_id,
                    quantity,
                    buyer: from.clone(),
                    fulfilled: false,
                }));
                let order_id = inner.orders.len() as u64;
                vec![LedgerEvent::OrderPlaced {
                    order_id,
                    product_id,
                    product_name,
                    quantity,
                    buyer: from.clone(),
                }]
            }
            LedgerTx::FulfillOrder { order_id } => {
                inner.orders[(order_id - 1) as usize]
                    .as_mut()
                    .expect("validated above")
                    .fulfilled = true;
                vec![LedgerEvent::OrderFulfilled { order_id }]
            }
            // The contract emits no event for order deletion
            LedgerTx::DeleteOrder { order_id } => {
                inner.orders[(order_id - 1) as usize] = None;
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn accounts(&self) -> LedgerResult<Vec<AccountId>> {
        Ok(self.lock().accounts.clone())
    }

    async fn product_count(&self) -> LedgerResult<u64> {
        Ok(self.lock().products.len() as u64)
    }

    async fn get_product(&self, id: u64) -> LedgerResult<ProductRecord> {
        let inner = self.lock();
        Self::product_slot(&inner, id).cloned()
    }

    async fn order_count(&self) -> LedgerResult<u64> {
        Ok(self.lock().orders.len() as u64)
    }

    async fn get_order(&self, id: u64) -> LedgerResult<OrderRecord> {
        let inner = self.lock();
        Self::order_slot(&inner, id).cloned()
    }

    async fn estimate_gas(&self, tx: &LedgerTx, _from: &AccountId) -> LedgerResult<u64> {
        let inner = self.lock();
        Self::cost_of(&inner, tx)
    }

    async fn submit(
        &self,
        tx: LedgerTx,
        from: &AccountId,
        gas_limit: u64,
    ) -> LedgerResult<Receipt> {
        let events = {
            let mut inner = self.lock();

            if let Some(reason) = inner.revert_next.take() {
                return Err(LedgerError::Reverted(reason));
            }

            let cost = Self::cost_of(&inner, &tx)?;
            if gas_limit < cost {
                return Err(LedgerError::Reverted("Out of gas".into()));
            }

            Self::apply(&mut inner, tx, from)
        };

        for event in &events {
            // Send fails only when nobody is subscribed
            let _ = self.events_tx.send(event.clone());
        }

        Ok(Receipt {
            gas_used: GAS_BASE,
            events,
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::apply_gas_margin;

    fn add_widget_tx() -> LedgerTx {
        LedgerTx::AddProduct {
            name: "Product 1".into(),
            description: None,
            price: 100,
            quantity: 10,
            category: None,
        }
    }

    async fn submit_ok(ledger: &MemoryLedger, tx: LedgerTx, from: &AccountId) -> Receipt {
        let gas = ledger.estimate_gas(&tx, from).await.unwrap();
        ledger
            .submit(tx, from, apply_gas_margin(gas))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn adds_a_product() {
        let ledger = MemoryLedger::new(3);
        let owner = ledger.accounts().await.unwrap()[0].clone();

        let receipt = submit_ok(&ledger, add_widget_tx(), &owner).await;
        assert_eq!(receipt.assigned_product_id(), Some(1));
        assert_eq!(ledger.product_count().await.unwrap(), 1);

        let product = ledger.get_product(1).await.unwrap();
        assert_eq!(product.name, "Product 1");
        assert_eq!(product.price, 100);
        assert_eq!(product.quantity, 10);
    }

    #[tokio::test]
    async fn updates_a_product() {
        let ledger = MemoryLedger::new(3);
        let owner = ledger.accounts().await.unwrap()[0].clone();
        submit_ok(&ledger, add_widget_tx(), &owner).await;

        let update = LedgerTx::UpdateProduct {
            id: 1,
            name: "Updated Product".into(),
            description: None,
            price: 200,
            quantity: 20,
            category: None,
        };
        submit_ok(&ledger, update, &owner).await;

        let product = ledger.get_product(1).await.unwrap();
        assert_eq!(product.name, "Updated Product");
        assert_eq!(product.price, 200);
        assert_eq!(product.quantity, 20);
    }

    #[tokio::test]
    async fn removing_a_product_keeps_count_monotonic() {
        let ledger = MemoryLedger::new(3);
        let owner = ledger.accounts().await.unwrap()[0].clone();
        submit_ok(&ledger, add_widget_tx(), &owner).await;
        submit_ok(&ledger, LedgerTx::DeleteProduct { id: 1 }, &owner).await;

        // Count is monotonic; the slot itself is dead
        assert_eq!(ledger.product_count().await.unwrap(), 1);
        assert!(matches!(
            ledger.get_product(1).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn places_an_order_and_decrements_stock() {
        let ledger = MemoryLedger::new(3);
        let accounts = ledger.accounts().await.unwrap();
        let (owner, buyer) = (accounts[0].clone(), accounts[1].clone());
        submit_ok(&ledger, add_widget_tx(), &owner).await;

        let receipt = submit_ok(
            &ledger,
            LedgerTx::PlaceOrder {
                product_id: 1,
                quantity: 5,
            },
            &buyer,
        )
        .await;
        assert_eq!(receipt.assigned_order_id(), Some(1));
        assert_eq!(ledger.order_count().await.unwrap(), 1);

        let order = ledger.get_order(1).await.unwrap();
        assert_eq!(order.product_id, 1);
        assert_eq!(order.quantity, 5);
        assert_eq!(order.buyer, buyer);
        assert!(!order.fulfilled);

        assert_eq!(ledger.get_product(1).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn fulfills_an_order() {
        let ledger = MemoryLedger::new(3);
        let accounts = ledger.accounts().await.unwrap();
        let (owner, buyer) = (accounts[0].clone(), accounts[1].clone());
        submit_ok(&ledger, add_widget_tx(), &owner).await;
        submit_ok(
            &ledger,
            LedgerTx::PlaceOrder {
                product_id: 1,
                quantity: 5,
            },
            &buyer,
        )
        .await;

        submit_ok(&ledger, LedgerTx::FulfillOrder { order_id: 1 }, &owner).await;
        assert!(ledger.get_order(1).await.unwrap().fulfilled);
    }

    #[tokio::test]
    async fn rejects_orders_exceeding_stock() {
        let ledger = MemoryLedger::new(3);
        let owner = ledger.accounts().await.unwrap()[0].clone();
        submit_ok(&ledger, add_widget_tx(), &owner).await;

        let tx = LedgerTx::PlaceOrder {
            product_id: 1,
            quantity: 11,
        };
        let err = ledger.estimate_gas(&tx, &owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::Reverted(_)));
    }

    #[tokio::test]
    async fn reverts_when_gas_limit_is_below_cost() {
        let ledger = MemoryLedger::new(3);
        let owner = ledger.accounts().await.unwrap()[0].clone();

        let tx = add_widget_tx();
        let gas = ledger.estimate_gas(&tx, &owner).await.unwrap();
        let err = ledger.submit(tx, &owner, gas - 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::Reverted(_)));
        // Nothing was applied
        assert_eq!(ledger.product_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn injected_revert_applies_to_next_submit_only() {
        let ledger = MemoryLedger::new(3);
        let owner = ledger.accounts().await.unwrap()[0].clone();

        ledger.inject_revert("simulated failure");
        let tx = add_widget_tx();
        let gas = ledger.estimate_gas(&tx, &owner).await.unwrap();
        let err = ledger
            .submit(tx.clone(), &owner, apply_gas_margin(gas))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Reverted(_)));
        assert_eq!(ledger.product_count().await.unwrap(), 0);

        // The fault is one-shot
        submit_ok(&ledger, tx, &owner).await;
        assert_eq!(ledger.product_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mutations_reach_subscribers() {
        let ledger = MemoryLedger::new(3);
        let owner = ledger.accounts().await.unwrap()[0].clone();
        let mut events = ledger.subscribe();

        submit_ok(&ledger, add_widget_tx(), &owner).await;

        match events.recv().await.unwrap() {
            LedgerEvent::ProductAdded { id, name, .. } => {
                assert_eq!(id, 1);
                assert_eq!(name, "Product 1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
