//! Ledger Client - opaque wrapper around the external supply ledger
//!
//! The ledger is the authoritative store of record for products and
//! orders. This crate exposes it behind the [`Ledger`] trait: reads,
//! gas-estimated transaction submission with confirmation receipts, and a
//! long-lived event subscription.
//!
//! Two implementations are provided:
//!
//! - [`HttpLedger`]: talks to a ledger gateway over HTTP (production)
//! - `MemoryLedger` (feature `in-process`): full contract semantics in
//!   memory, for tests and local development

pub mod client;
pub mod error;
pub mod http;
pub mod types;

#[cfg(feature = "in-process")]
pub mod memory;

pub use client::Ledger;
pub use error::{LedgerError, LedgerResult};
pub use http::HttpLedger;
pub use types::{
    AccountId, LedgerEvent, LedgerTx, OrderRecord, ProductRecord, Receipt, apply_gas_margin,
};

#[cfg(feature = "in-process")]
pub use memory::MemoryLedger;
