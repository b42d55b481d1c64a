//! Product Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Product ID type (mirror-side record identifier)
pub type ProductId = RecordId;

/// Product projection in the mirror store
///
/// Price and quantity are integer units copied from the ledger; the
/// ledger entry at the mapped ledger ID stays canonical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert/update payload (no record id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductContent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductContent {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        price: u64,
        quantity: u64,
        category: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            price,
            quantity,
            category,
            created_at: Utc::now(),
        }
    }
}
