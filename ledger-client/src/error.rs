//! Ledger client error types

use thiserror::Error;

/// Ledger error type
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Record does not exist on the ledger (or has been deleted)
    #[error("Not found on ledger: {0}")]
    NotFound(String),

    /// Submitted transaction was rejected by the ledger.
    /// A reverted transaction has no effect; no mirror write may follow it.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Ledger unreachable or call timed out
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Gateway returned a malformed or unexpected response
    #[error("Gateway error: {0}")]
    Gateway(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            LedgerError::Unavailable(e.to_string())
        } else {
            LedgerError::Gateway(e.to_string())
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
