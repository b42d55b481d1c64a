//! Coordinator integration tests
//!
//! Exercise the ledger-first mutation flows and the event-reaction path
//! against the in-process ledger and an in-memory mirror store.

use std::sync::Arc;
use std::time::Duration;

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use ledger_client::{
    Ledger, LedgerError, LedgerEvent, LedgerTx, MemoryLedger, apply_gas_margin,
};
use shared::catalog::{CreateProductRequest, UpdateProductRequest};

use mirror_server::db::DbService;
use mirror_server::db::models::OrderStatus;
use mirror_server::db::repository::{MappingRepository, OrderRepository, ProductRepository};
use mirror_server::sync::{SyncCoordinator, SyncError};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    ledger: Arc<MemoryLedger>,
    db: Surreal<Db>,
    coordinator: SyncCoordinator,
}

async fn setup() -> Harness {
    let ledger = Arc::new(MemoryLedger::new(3));
    let db = DbService::memory().await.expect("in-memory db").db;
    let coordinator = SyncCoordinator::new(ledger.clone(), db.clone(), TEST_TIMEOUT);
    Harness {
        ledger,
        db,
        coordinator,
    }
}

fn widget_request() -> CreateProductRequest {
    CreateProductRequest {
        name: "Widget".to_string(),
        description: None,
        price: 100,
        quantity: 10,
        category: None,
    }
}

fn widget_update(quantity: u64) -> UpdateProductRequest {
    UpdateProductRequest {
        name: "Widget".to_string(),
        description: None,
        price: 100,
        quantity,
        category: None,
    }
}

#[tokio::test]
async fn create_establishes_mapping_bijection() {
    let h = setup().await;

    let (ledger_id, product) = h
        .coordinator
        .create_product(widget_request())
        .await
        .expect("create failed");
    assert_eq!(ledger_id, 1);

    let mappings = MappingRepository::new(h.db.clone());
    let all = mappings.find_all().await.unwrap();
    assert_eq!(all.len(), 1);

    let mirror_id = product.id.expect("mirror record has an id");
    let by_ledger = mappings.find_by_ledger_id(1).await.unwrap().unwrap();
    assert_eq!(by_ledger.mirror_id, mirror_id);
    let by_mirror = mappings.find_by_mirror_id(&mirror_id).await.unwrap().unwrap();
    assert_eq!(by_mirror.ledger_id, 1);
}

#[tokio::test]
async fn created_widget_agrees_across_both_stores() {
    let h = setup().await;

    let (ledger_id, product) = h
        .coordinator
        .create_product(widget_request())
        .await
        .unwrap();

    let ledger_record = h.ledger.get_product(ledger_id).await.unwrap();
    assert_eq!(ledger_record.name, product.name);
    assert_eq!(ledger_record.price, product.price);
    assert_eq!(ledger_record.quantity, product.quantity);
    assert_eq!(product.name, "Widget");
    assert_eq!(product.price, 100);
    assert_eq!(product.quantity, 10);
}

#[tokio::test]
async fn update_propagates_to_mirror() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();

    let updated = h
        .coordinator
        .update_product(1, widget_update(5))
        .await
        .expect("update failed");
    assert_eq!(updated.quantity, 5);

    assert_eq!(h.ledger.get_product(1).await.unwrap().quantity, 5);
    let products = ProductRepository::new(h.db.clone());
    assert_eq!(products.find_all().await.unwrap()[0].quantity, 5);
}

#[tokio::test]
async fn reverted_update_leaves_mirror_unchanged() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();

    h.ledger.inject_revert("simulated node failure");
    let err = h
        .coordinator
        .update_product(1, widget_update(5))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Ledger(LedgerError::Reverted(_))));

    // Prior values on both sides
    assert_eq!(h.ledger.get_product(1).await.unwrap().quantity, 10);
    let products = ProductRepository::new(h.db.clone());
    assert_eq!(products.find_all().await.unwrap()[0].quantity, 10);
}

#[tokio::test]
async fn update_of_missing_ledger_id_fails_before_spending_gas() {
    let h = setup().await;

    let err = h
        .coordinator
        .update_product(42, widget_update(5))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Ledger(LedgerError::NotFound(_))));
}

#[tokio::test]
async fn delete_removes_mirror_mapping_and_ledger_slot() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();

    h.coordinator.delete_product(1).await.expect("delete failed");

    assert!(matches!(
        h.ledger.get_product(1).await,
        Err(LedgerError::NotFound(_))
    ));
    let products = ProductRepository::new(h.db.clone());
    assert!(products.find_all().await.unwrap().is_empty());
    let mappings = MappingRepository::new(h.db.clone());
    assert!(mappings.find_all().await.unwrap().is_empty());

    // The ledger count stays monotonic after the delete
    assert_eq!(h.ledger.product_count().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_without_mapping_fails_with_mapping_miss() {
    let h = setup().await;

    // Product created by another ledger client; this process never
    // mirrored it, so no mapping row exists.
    let owner = h.ledger.accounts().await.unwrap()[0].clone();
    let tx = LedgerTx::AddProduct {
        name: "Widget".to_string(),
        description: None,
        price: 100,
        quantity: 10,
        category: None,
    };
    let gas = h.ledger.estimate_gas(&tx, &owner).await.unwrap();
    h.ledger
        .submit(tx, &owner, apply_gas_margin(gas))
        .await
        .unwrap();

    let err = h.coordinator.delete_product(1).await.unwrap_err();
    assert!(matches!(err, SyncError::MappingMiss { ledger_id: 1 }));
}

#[tokio::test]
async fn place_order_decrements_stock_and_mirrors_pending_order() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();
    let buyer = h.ledger.accounts().await.unwrap()[1].clone();

    let order = h
        .coordinator
        .place_order("Widget", 3, &buyer)
        .await
        .expect("order failed");

    assert_eq!(order.order_id, 1);
    assert_eq!(order.product_name, "Widget");
    assert_eq!(order.quantity, 3);
    assert_eq!(order.buyer, buyer);
    assert_eq!(order.status, OrderStatus::Pending);

    assert_eq!(h.ledger.get_product(1).await.unwrap().quantity, 7);
}

#[tokio::test]
async fn place_order_with_insufficient_stock_reverts_cleanly() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();
    let buyer = h.ledger.accounts().await.unwrap()[1].clone();

    let err = h
        .coordinator
        .place_order("Widget", 11, &buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Ledger(LedgerError::Reverted(_))));

    assert_eq!(h.ledger.get_product(1).await.unwrap().quantity, 10);
    let orders = OrderRepository::new(h.db.clone());
    assert!(orders.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn place_order_by_unknown_name_fails_not_found() {
    let h = setup().await;
    let buyer = h.ledger.accounts().await.unwrap()[1].clone();

    let err = h
        .coordinator
        .place_order("Gizmo", 1, &buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Ledger(LedgerError::NotFound(_))));
}

#[tokio::test]
async fn name_resolution_skips_deleted_slots() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();
    let mut second = widget_request();
    second.name = "Gizmo".to_string();
    h.coordinator.create_product(second).await.unwrap();
    h.coordinator.delete_product(1).await.unwrap();

    let (id, record) = h.coordinator.resolve_product_by_name("Gizmo").await.unwrap();
    assert_eq!(id, 2);
    assert_eq!(record.name, "Gizmo");
}

#[tokio::test]
async fn fulfill_order_updates_both_sides() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();
    let buyer = h.ledger.accounts().await.unwrap()[1].clone();
    h.coordinator.place_order("Widget", 3, &buyer).await.unwrap();

    let order = h.coordinator.fulfill_order(1).await.expect("fulfill failed");
    assert_eq!(order.status, OrderStatus::Fulfilled);
    assert!(h.ledger.get_order(1).await.unwrap().fulfilled);
}

#[tokio::test]
async fn delete_order_removes_mirror_row() {
    let h = setup().await;
    h.coordinator.create_product(widget_request()).await.unwrap();
    let buyer = h.ledger.accounts().await.unwrap()[1].clone();
    h.coordinator.place_order("Widget", 3, &buyer).await.unwrap();

    h.coordinator.delete_order(1).await.expect("delete failed");

    assert!(matches!(
        h.ledger.get_order(1).await,
        Err(LedgerError::NotFound(_))
    ));
    let orders = OrderRepository::new(h.db.clone());
    assert!(orders.find_all().await.unwrap().is_empty());
}

// =============================================================================
// Event-reaction path
// =============================================================================

fn widget_added_event() -> LedgerEvent {
    LedgerEvent::ProductAdded {
        id: 1,
        name: "Widget".to_string(),
        description: None,
        price: 100,
        quantity: 10,
        category: None,
    }
}

#[tokio::test]
async fn replayed_product_added_event_creates_one_row() {
    let h = setup().await;

    h.coordinator.apply_event(&widget_added_event()).await.unwrap();
    h.coordinator.apply_event(&widget_added_event()).await.unwrap();

    let products = ProductRepository::new(h.db.clone());
    assert_eq!(products.find_all().await.unwrap().len(), 1);
    let mappings = MappingRepository::new(h.db.clone());
    assert_eq!(mappings.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn product_updated_event_refreshes_existing_row() {
    let h = setup().await;
    h.coordinator.apply_event(&widget_added_event()).await.unwrap();

    let update = LedgerEvent::ProductUpdated {
        id: 1,
        name: "Widget".to_string(),
        description: None,
        price: 150,
        quantity: 4,
        category: None,
    };
    h.coordinator.apply_event(&update).await.unwrap();

    let products = ProductRepository::new(h.db.clone());
    let all = products.find_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].price, 150);
    assert_eq!(all[0].quantity, 4);
}

#[tokio::test]
async fn product_deleted_event_is_replay_tolerant() {
    let h = setup().await;
    h.coordinator.apply_event(&widget_added_event()).await.unwrap();

    let deleted = LedgerEvent::ProductDeleted { id: 1 };
    h.coordinator.apply_event(&deleted).await.unwrap();
    // Second delivery of the same event is a no-op, not an error
    h.coordinator.apply_event(&deleted).await.unwrap();

    let products = ProductRepository::new(h.db.clone());
    assert!(products.find_all().await.unwrap().is_empty());
    let mappings = MappingRepository::new(h.db.clone());
    assert!(mappings.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn order_events_upsert_by_order_id() {
    let h = setup().await;

    let placed = LedgerEvent::OrderPlaced {
        order_id: 1,
        product_id: 1,
        product_name: "Widget".to_string(),
        quantity: 2,
        buyer: "0xbuyer".to_string(),
    };
    h.coordinator.apply_event(&placed).await.unwrap();
    h.coordinator.apply_event(&placed).await.unwrap();

    let orders = OrderRepository::new(h.db.clone());
    let all = orders.find_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, OrderStatus::Pending);

    h.coordinator
        .apply_event(&LedgerEvent::OrderFulfilled { order_id: 1 })
        .await
        .unwrap();
    let order = orders.find_by_order_id(1).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Fulfilled);
}

#[tokio::test]
async fn fulfillment_event_for_unknown_order_is_skipped() {
    let h = setup().await;

    // May arrive before the placement event after a reconnect
    h.coordinator
        .apply_event(&LedgerEvent::OrderFulfilled { order_id: 9 })
        .await
        .expect("must not error");
}

#[tokio::test]
async fn listener_converges_mirror_for_foreign_mutations() {
    let h = setup().await;

    let listener = tokio::spawn(mirror_server::sync::listener::run(h.coordinator.clone()));

    // Mutation from "another client": straight to the ledger
    let owner = h.ledger.accounts().await.unwrap()[0].clone();
    let tx = LedgerTx::AddProduct {
        name: "Widget".to_string(),
        description: None,
        price: 100,
        quantity: 10,
        category: None,
    };
    let gas = h.ledger.estimate_gas(&tx, &owner).await.unwrap();
    h.ledger
        .submit(tx, &owner, apply_gas_margin(gas))
        .await
        .unwrap();

    // Wait for the listener to apply the event
    let mappings = MappingRepository::new(h.db.clone());
    let mut mirrored = false;
    for _ in 0..50 {
        if mappings.find_by_ledger_id(1).await.unwrap().is_some() {
            mirrored = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(mirrored, "listener did not mirror the foreign mutation");

    let products = ProductRepository::new(h.db.clone());
    assert_eq!(products.find_all().await.unwrap().len(), 1);

    listener.abort();
}

// =============================================================================
// Failure injection around the non-atomic dual write
// =============================================================================

#[tokio::test]
async fn store_failure_before_submit_spends_no_gas() {
    let ledger = Arc::new(MemoryLedger::new(3));
    // Unconnected handle: every store operation fails
    let db: Surreal<Db> = Surreal::init();
    let coordinator = SyncCoordinator::new(ledger.clone(), db, TEST_TIMEOUT);

    let err = coordinator.create_product(widget_request()).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(_)));

    // The counter write failed before any ledger transaction
    assert_eq!(ledger.product_count().await.unwrap(), 0);
}

#[tokio::test]
async fn mapping_failure_after_confirmation_is_surfaced_not_rolled_back() {
    let h = setup().await;

    // Poison the mapping table so the post-confirmation insert collides
    let mappings = MappingRepository::new(h.db.clone());
    mappings
        .insert(1, RecordId::from(("product", "dangling")))
        .await
        .unwrap();

    let err = h.coordinator.create_product(widget_request()).await.unwrap_err();
    assert!(matches!(err, SyncError::MirrorWrite(_)));

    // The ledger mutation is final; the documented inconsistency remains
    assert_eq!(h.ledger.product_count().await.unwrap(), 1);
    assert_eq!(h.ledger.get_product(1).await.unwrap().name, "Widget");
    let stale = mappings.find_by_ledger_id(1).await.unwrap().unwrap();
    assert_eq!(stale.mirror_id, RecordId::from(("product", "dangling")));
}
