//! Id Mapping Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One row of the ledger-id <-> mirror-id bijection.
///
/// Invariant: every live ledger product has exactly one mapping row and
/// one mirror record. Deleting either side must delete all three; a row
/// surviving its product is a dangling mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Ledger-assigned integer product id (unique)
    pub ledger_id: u64,
    /// Mirror store record id (unique)
    pub mirror_id: RecordId,
}
