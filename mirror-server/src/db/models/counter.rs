//! Counter Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Durable monotonic sequence.
///
/// Incremented on every product create to pre-allocate a human-facing
/// product number. The id-mapping table does NOT use this value — it
/// stores the ledger's own receipt-derived id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub seq: u64,
}
