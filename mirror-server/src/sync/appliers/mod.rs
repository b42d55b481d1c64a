//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific ledger event type. Appliers are PURE functions:
//! they turn an event into a planned [`MirrorMutation`] without
//! touching the store. Execution lives in the coordinator.

use enum_dispatch::enum_dispatch;

use ledger_client::LedgerEvent;

use super::MirrorMutation;

mod order_fulfilled;
mod order_placed;
mod product_added;
mod product_deleted;
mod product_updated;

pub use order_fulfilled::OrderFulfilledApplier;
pub use order_placed::OrderPlacedApplier;
pub use product_added::ProductAddedApplier;
pub use product_deleted::ProductDeletedApplier;
pub use product_updated::ProductUpdatedApplier;

/// Pure event-to-mutation planner
///
/// Returns `None` when the event does not concern this applier.
#[enum_dispatch]
pub trait EventApplier {
    fn plan(&self, event: &LedgerEvent) -> Option<MirrorMutation>;
}

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    ProductAdded(ProductAddedApplier),
    ProductUpdated(ProductUpdatedApplier),
    ProductDeleted(ProductDeletedApplier),
    OrderPlaced(OrderPlacedApplier),
    OrderFulfilled(OrderFulfilledApplier),
}

/// Convert a LedgerEvent reference to its EventAction
///
/// This is the ONLY place with an exhaustive match on LedgerEvent.
impl From<&LedgerEvent> for EventAction {
    fn from(event: &LedgerEvent) -> Self {
        match event {
            LedgerEvent::ProductAdded { .. } => EventAction::ProductAdded(ProductAddedApplier),
            LedgerEvent::ProductUpdated { .. } => {
                EventAction::ProductUpdated(ProductUpdatedApplier)
            }
            LedgerEvent::ProductDeleted { .. } => {
                EventAction::ProductDeleted(ProductDeletedApplier)
            }
            LedgerEvent::OrderPlaced { .. } => EventAction::OrderPlaced(OrderPlacedApplier),
            LedgerEvent::OrderFulfilled { .. } => {
                EventAction::OrderFulfilled(OrderFulfilledApplier)
            }
        }
    }
}

/// Plan the mirror mutation for an arbitrary ledger event
pub fn plan_for(event: &LedgerEvent) -> Option<MirrorMutation> {
    EventAction::from(event).plan(event)
}
