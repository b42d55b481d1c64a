//! ProductDeleted event applier

use ledger_client::LedgerEvent;

use super::EventApplier;
use crate::sync::MirrorMutation;

/// ProductDeleted applier
///
/// Removal is keyed by ledger id; resolving the mirror record (and
/// tolerating an already-removed row on replay) happens at execution.
pub struct ProductDeletedApplier;

impl EventApplier for ProductDeletedApplier {
    fn plan(&self, event: &LedgerEvent) -> Option<MirrorMutation> {
        if let LedgerEvent::ProductDeleted { id } = event {
            Some(MirrorMutation::RemoveProduct { ledger_id: *id })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deleted_plans_removal() {
        let event = LedgerEvent::ProductDeleted { id: 9 };

        let applier = ProductDeletedApplier;
        assert_eq!(
            applier.plan(&event),
            Some(MirrorMutation::RemoveProduct { ledger_id: 9 })
        );
    }

    #[test]
    fn test_product_deleted_ignores_other_events() {
        let event = LedgerEvent::OrderPlaced {
            order_id: 1,
            product_id: 2,
            product_name: "Widget".to_string(),
            quantity: 1,
            buyer: "0xabc".to_string(),
        };

        let applier = ProductDeletedApplier;
        assert_eq!(applier.plan(&event), None);
    }
}
