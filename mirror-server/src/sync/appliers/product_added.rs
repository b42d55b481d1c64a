//! ProductAdded event applier
//!
//! Plans an upsert so the mirror gains (or refreshes) the row for a
//! product that appeared on the ledger. Upsert rather than insert:
//! the event stream is at-least-once and the request path may already
//! have written the row.

use ledger_client::LedgerEvent;

use super::EventApplier;
use crate::sync::{MirrorMutation, ProductFields};

/// ProductAdded applier
pub struct ProductAddedApplier;

impl EventApplier for ProductAddedApplier {
    fn plan(&self, event: &LedgerEvent) -> Option<MirrorMutation> {
        if let LedgerEvent::ProductAdded {
            id,
            name,
            description,
            price,
            quantity,
            category,
        } = event
        {
            Some(MirrorMutation::UpsertProduct {
                ledger_id: *id,
                fields: ProductFields {
                    name: name.clone(),
                    description: description.clone(),
                    price: *price,
                    quantity: *quantity,
                    category: category.clone(),
                },
            })
        } else {
            None
        }
    }
}
