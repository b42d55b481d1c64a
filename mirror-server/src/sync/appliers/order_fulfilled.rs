//! OrderFulfilled event applier

use ledger_client::LedgerEvent;

use super::EventApplier;
use crate::sync::MirrorMutation;

/// OrderFulfilled applier
pub struct OrderFulfilledApplier;

impl EventApplier for OrderFulfilledApplier {
    fn plan(&self, event: &LedgerEvent) -> Option<MirrorMutation> {
        if let LedgerEvent::OrderFulfilled { order_id } = event {
            Some(MirrorMutation::MarkOrderFulfilled {
                order_id: *order_id,
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
    fn test_order_fulfilled_plans_status_change() {
        let event = LedgerEvent::OrderFulfilled { order_id: 6 };

        let applier = OrderFulfilledApplier;
        assert_eq!(
            applier.plan(&event),
            Some(MirrorMutation::MarkOrderFulfilled { order_id: 6 })
        );
    }

    #[test]
    fn test_order_fulfilled_ignores_other_events() {
        let event = LedgerEvent::ProductAdded {
            id: 1,
            name: "Widget".to_string(),
            description: None,
            price: 100,
            quantity: 10,
            category: None,
        };

        let applier = OrderFulfilledApplier;
        assert_eq!(applier.plan(&event), None);
    }
}
