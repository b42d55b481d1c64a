//! OrderPlaced event applier

use ledger_client::LedgerEvent;

use super::EventApplier;
use crate::sync::MirrorMutation;

/// OrderPlaced applier
///
/// Orders carry their ledger id directly (no mapping table), so the
/// planned upsert is keyed on `order_id`.
pub struct OrderPlacedApplier;

impl EventApplier for OrderPlacedApplier {
    fn plan(&self, event: &LedgerEvent) -> Option<MirrorMutation> {
        if let LedgerEvent::OrderPlaced {
            order_id,
            product_id: _,
            product_name,
            quantity,
            buyer,
        } = event
        {
            Some(MirrorMutation::UpsertOrder {
                order_id: *order_id,
                product_name: product_name.clone(),
                quantity: *quantity,
                buyer: buyer.clone(),
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
    fn test_order_placed_plans_upsert() {
        let event = LedgerEvent::OrderPlaced {
            order_id: 4,
            product_id: 2,
            product_name: "Widget".to_string(),
            quantity: 3,
            buyer: "0xbuyer".to_string(),
        };

        let applier = OrderPlacedApplier;
        assert_eq!(
            applier.plan(&event),
            Some(MirrorMutation::UpsertOrder {
                order_id: 4,
                product_name: "Widget".to_string(),
                quantity: 3,
                buyer: "0xbuyer".to_string(),
            })
        );
    }

    #[test]
    fn test_order_placed_ignores_other_events() {
        let event = LedgerEvent::ProductDeleted { id: 1 };

        let applier = OrderPlacedApplier;
        assert_eq!(applier.plan(&event), None);
    }
}
