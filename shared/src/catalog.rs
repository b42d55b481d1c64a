//! Catalog API DTOs
//!
//! Product and order payloads shared between server and clients.
//! Prices and quantities are integer units, exactly as the ledger stores
//! them; no float conversion happens anywhere in the stack.

use serde::{Deserialize, Serialize};

// =============================================================================
// Product DTOs
// =============================================================================

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Update product payload
///
/// The ledger update transaction always carries the full field set, so
/// all fields are required here (unlike a PATCH-style partial update).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Product as rendered to API consumers
///
/// `ledger_id` is the authoritative key; `mirror_id` is present when the
/// mirror copy exists (it can lag behind the ledger between a confirmed
/// transaction and the mirror upsert).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub ledger_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// =============================================================================
// Order DTOs
// =============================================================================

/// Place order payload
///
/// Orders are placed by product name, matching the ledger-side resolution
/// rule. Duplicate product names resolve to the first ledger match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_name: String,
    pub quantity: u64,
}

/// Order as rendered to API consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: u64,
    pub product_name: String,
    pub quantity: u64,
    pub buyer: String,
    pub status: String,
}
