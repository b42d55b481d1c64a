//! Order Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Order lifecycle in the mirror store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Fulfilled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Fulfilled => "fulfilled",
        }
    }
}

/// Order projection, keyed by the ledger-assigned order id.
///
/// Order ids are shared 1:1 with the ledger by construction, so no
/// mapping table is involved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub order_id: u64,
    /// By-name product reference, as the ledger order flow resolves it
    pub product_name: String,
    pub quantity: u64,
    /// Ledger account that placed the order
    pub buyer: String,
    pub status: OrderStatus,
}

/// Insert payload (no record id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderContent {
    pub order_id: u64,
    pub product_name: String,
    pub quantity: u64,
    pub buyer: String,
    pub status: OrderStatus,
}
