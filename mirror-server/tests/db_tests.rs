//! Mirror store tests
//!
//! Repository behavior against both engines: RocksDB on a temp dir for
//! persistence, Mem for everything else.

use surrealdb::RecordId;

use mirror_server::db::DbService;
use mirror_server::db::models::ProductContent;
use mirror_server::db::repository::{
    CounterRepository, MappingRepository, ProductRepository, RepoError,
};

#[tokio::test]
async fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mirror.db").to_string_lossy().to_string();

    {
        let db = DbService::new(&path).await.expect("open");
        let repo = ProductRepository::new(db.db.clone());
        repo.create(ProductContent::new("Widget", None, 100, 10, None))
            .await
            .expect("insert");
    }

    // SurrealDB's local engine releases the RocksDB file lock from a
    // background task after the handle drops, so retry briefly on reopen.
    let mut db = DbService::new(&path).await;
    for _ in 0..50 {
        if db.is_ok() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        db = DbService::new(&path).await;
    }
    let db = db.expect("reopen");
    let repo = ProductRepository::new(db.db.clone());
    let all = repo.find_all().await.expect("query");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Widget");
}

#[tokio::test]
async fn counter_sequence_is_monotonic() {
    let db = DbService::memory().await.unwrap().db;
    let counters = CounterRepository::new(db);

    assert_eq!(counters.current("product").await.unwrap(), 0);
    assert_eq!(counters.next("product").await.unwrap(), 1);
    assert_eq!(counters.next("product").await.unwrap(), 2);
    assert_eq!(counters.next("product").await.unwrap(), 3);
    assert_eq!(counters.current("product").await.unwrap(), 3);

    // Independent sequences per name
    assert_eq!(counters.next("order").await.unwrap(), 1);
}

#[tokio::test]
async fn mapping_rejects_duplicate_ledger_id() {
    let db = DbService::memory().await.unwrap().db;
    let mappings = MappingRepository::new(db);

    mappings
        .insert(1, RecordId::from(("product", "a")))
        .await
        .unwrap();
    let err = mappings
        .insert(1, RecordId::from(("product", "b")))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn mapping_delete_is_idempotent() {
    let db = DbService::memory().await.unwrap().db;
    let mappings = MappingRepository::new(db);

    mappings
        .insert(7, RecordId::from(("product", "x")))
        .await
        .unwrap();
    mappings.delete_by_ledger_id(7).await.unwrap();
    // Absent row: still Ok
    mappings.delete_by_ledger_id(7).await.unwrap();
    assert!(mappings.find_by_ledger_id(7).await.unwrap().is_none());
}
