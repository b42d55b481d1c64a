//! Ledger event listener
//!
//! Background task draining the ledger's broadcast stream and applying
//! each event to the mirror through the coordinator. Events from other
//! ledger clients arrive here too, so this is what keeps the mirror
//! converging when this process is not the only writer.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};

use super::SyncCoordinator;

/// Drain the event stream until the ledger side closes it.
///
/// Apply failures are logged and skipped: one poisoned event must not
/// stall the stream, and at-least-once delivery means a later replay can
/// still converge the row.
pub async fn run(coordinator: SyncCoordinator) {
    let mut events = coordinator.ledger().subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(?event, "Ledger event received");
                if let Err(e) = coordinator.apply_event(&event).await {
                    error!(?event, error = %e, "Failed to apply ledger event");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                // Mirror may be stale for the skipped span; later events
                // carry full records, so upserts re-converge it.
                warn!(skipped, "Event stream lagged, events dropped");
            }
            Err(RecvError::Closed) => {
                warn!("Ledger event stream closed, listener exiting");
                return;
            }
        }
    }
}
