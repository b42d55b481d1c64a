//! Dual-ledger synchronization
//!
//! Keeps the authoritative external ledger and the mirror store
//! consistent, bridged by the id-mapping table:
//!
//! - [`coordinator`]: request-driven mutation flows (write ledger, await
//!   confirmation, then write mirror + mapping)
//! - [`appliers`]: pure per-event planners turning ledger events into
//!   mirror mutations
//! - [`listener`]: background task draining the ledger event stream and
//!   applying mutations idempotently
//!
//! The ledger is the sole arbiter of existence; mirror and mapping are
//! always derived, never authoritative.

pub mod appliers;
pub mod coordinator;
pub mod listener;

pub use coordinator::SyncCoordinator;

use ledger_client::LedgerError;
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::AppError;

/// Synchronization error taxonomy.
///
/// `MappingMiss` and `MirrorWrite` both describe a partially-applied
/// operation: the ledger side is confirmed and final, the mirror side is
/// stale. Neither is retried or compensated automatically.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Ledger call failed (not found, reverted, unavailable)
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No mapping row for a ledger id during update/delete
    #[error("No id mapping for ledger id {ledger_id}")]
    MappingMiss { ledger_id: u64 },

    /// Ledger confirmed but the mirror/mapping write failed.
    /// Known inconsistency; the ledger mutation is final.
    #[error("Mirror write failed after ledger confirmation: {0}")]
    MirrorWrite(String),

    /// Confirmation receipt did not carry the expected assignment event
    #[error("Receipt did not carry the expected event")]
    ReceiptMissingId,

    /// Mirror store failure before any ledger gas was spent
    #[error(transparent)]
    Store(#[from] RepoError),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Ledger(e) => e.into(),
            SyncError::MappingMiss { ledger_id } => AppError::MappingMiss(ledger_id),
            SyncError::MirrorWrite(msg) => AppError::MirrorWrite(msg),
            SyncError::ReceiptMissingId => {
                AppError::Internal("Confirmation receipt missing assigned id".into())
            }
            SyncError::Store(e) => e.into(),
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Fields of a product as carried by ledger events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub quantity: u64,
    pub category: Option<String>,
}

/// Planned mirror-store mutation, produced by a pure event applier.
///
/// Execution (in [`SyncCoordinator::apply_mutation`]) upserts keyed on
/// ledger id, so replaying the same event never duplicates rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorMutation {
    UpsertProduct {
        ledger_id: u64,
        fields: ProductFields,
    },
    RemoveProduct {
        ledger_id: u64,
    },
    UpsertOrder {
        order_id: u64,
        product_name: String,
        quantity: u64,
        buyer: String,
    },
    MarkOrderFulfilled {
        order_id: u64,
    },
}
