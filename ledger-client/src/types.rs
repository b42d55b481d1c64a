//! Ledger wire types
//!
//! Transactions, events and records mirroring the supply ledger's
//! contract surface. Prices and quantities are integer units end to end.

use serde::{Deserialize, Serialize};

/// Ledger account identifier (hex address on the real ledger)
pub type AccountId = String;

/// Product record as read from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Order record as read from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub product_id: u64,
    pub quantity: u64,
    pub buyer: AccountId,
    pub fulfilled: bool,
}

/// A mutating ledger transaction
///
/// Every variant maps 1:1 onto a contract method. Assigned IDs come back
/// in the confirmation [`Receipt`], never in the transaction itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum LedgerTx {
    AddProduct {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        price: u64,
        quantity: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    UpdateProduct {
        id: u64,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        price: u64,
        quantity: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    DeleteProduct {
        id: u64,
    },
    PlaceOrder {
        product_id: u64,
        quantity: u64,
    },
    FulfillOrder {
        order_id: u64,
    },
    DeleteOrder {
        order_id: u64,
    },
}

impl LedgerTx {
    /// Contract method name, used in logs and by the HTTP gateway
    pub fn method(&self) -> &'static str {
        match self {
            LedgerTx::AddProduct { .. } => "addProduct",
            LedgerTx::UpdateProduct { .. } => "updateProduct",
            LedgerTx::DeleteProduct { .. } => "deleteProduct",
            LedgerTx::PlaceOrder { .. } => "placeOrder",
            LedgerTx::FulfillOrder { .. } => "fulfillOrder",
            LedgerTx::DeleteOrder { .. } => "deleteOrder",
        }
    }
}

/// Event emitted by the ledger
///
/// Events originate from *any* ledger client, not just this process, and
/// are delivered at-least-once. Consumers must handle replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LedgerEvent {
    ProductAdded {
        id: u64,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        price: u64,
        quantity: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    ProductUpdated {
        id: u64,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        price: u64,
        quantity: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    ProductDeleted {
        id: u64,
    },
    OrderPlaced {
        order_id: u64,
        product_id: u64,
        product_name: String,
        quantity: u64,
        buyer: AccountId,
    },
    OrderFulfilled {
        order_id: u64,
    },
}

/// Confirmation returned after a submitted transaction is finalized
///
/// Carries the events the transaction emitted; ledger-assigned IDs are
/// extracted from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub gas_used: u64,
    pub events: Vec<LedgerEvent>,
}

impl Receipt {
    /// Ledger-assigned product ID from the first `ProductAdded` event
    pub fn assigned_product_id(&self) -> Option<u64> {
        self.events.iter().find_map(|e| match e {
            LedgerEvent::ProductAdded { id, .. } => Some(*id),
            _ => None,
        })
    }

    /// Ledger-assigned order ID from the first `OrderPlaced` event
    pub fn assigned_order_id(&self) -> Option<u64> {
        self.events.iter().find_map(|e| match e {
            LedgerEvent::OrderPlaced { order_id, .. } => Some(*order_id),
            _ => None,
        })
    }
}

/// Apply the fixed 20% safety margin to a gas estimate (rounded up).
///
/// Every mutating submit must use `apply_gas_margin(estimate)` as its gas
/// limit; submitting with the bare estimate risks an out-of-gas revert.
pub fn apply_gas_margin(estimate: u64) -> u64 {
    estimate + estimate.div_ceil(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_margin_is_twenty_percent_rounded_up() {
        assert_eq!(apply_gas_margin(100), 120);
        assert_eq!(apply_gas_margin(101), 122); // 20.2 rounds up to 21
        assert_eq!(apply_gas_margin(0), 0);
        assert_eq!(apply_gas_margin(1), 2);
    }

    #[test]
    fn receipt_extracts_assigned_ids() {
        let receipt = Receipt {
            gas_used: 42_000,
            events: vec![LedgerEvent::ProductAdded {
                id: 7,
                name: "Widget".into(),
                description: None,
                price: 100,
                quantity: 10,
                category: None,
            }],
        };
        assert_eq!(receipt.assigned_product_id(), Some(7));
        assert_eq!(receipt.assigned_order_id(), None);
    }

    #[test]
    fn tx_method_names_match_contract_surface() {
        let tx = LedgerTx::PlaceOrder {
            product_id: 1,
            quantity: 3,
        };
        assert_eq!(tx.method(), "placeOrder");
    }
}
