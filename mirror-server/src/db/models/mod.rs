//! Mirror store models
//!
//! Denormalized, queryable copies of ledger state. The ledger entry at
//! the mapped ledger ID is always the canonical copy; these records are
//! derived, never authoritative.

pub mod counter;
pub mod id_mapping;
pub mod order;
pub mod product;
pub mod user;

pub use counter::Counter;
pub use id_mapping::IdMapping;
pub use order::{Order, OrderContent, OrderStatus};
pub use product::{Product, ProductContent};
pub use user::{Role, User, UserContent};
