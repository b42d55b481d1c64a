//! ProductUpdated event applier

use ledger_client::LedgerEvent;

use super::EventApplier;
use crate::sync::{MirrorMutation, ProductFields};

/// ProductUpdated applier
///
/// Plans the same upsert shape as ProductAdded: the event carries the
/// full post-update record, so the mirror row is simply replaced.
pub struct ProductUpdatedApplier;

impl EventApplier for ProductUpdatedApplier {
    fn plan(&self, event: &LedgerEvent) -> Option<MirrorMutation> {
        if let LedgerEvent::ProductUpdated {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_updated_plans_full_replace() {
        let event = LedgerEvent::ProductUpdated {
            id: 3,
            name: "Widget v2".to_string(),
            description: None,
            price: 150,
            quantity: 5,
            category: None,
        };

        let applier = ProductUpdatedApplier;
        let mutation = applier.plan(&event).expect("should plan a mutation");

        match mutation {
            MirrorMutation::UpsertProduct { ledger_id, fields } => {
                assert_eq!(ledger_id, 3);
                assert_eq!(fields.name, "Widget v2");
                assert_eq!(fields.price, 150);
                assert_eq!(fields.quantity, 5);
                assert_eq!(fields.description, None);
            }
            other => panic!("unexpected mutation: {other:?}"),
        }
    }

    #[test]
    fn test_product_updated_ignores_other_events() {
        let event = LedgerEvent::OrderFulfilled { order_id: 1 };

        let applier = ProductUpdatedApplier;
        assert_eq!(applier.plan(&event), None);
    }
}
