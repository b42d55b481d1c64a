//! Id Mapping Repository
//!
//! Maintains the strict 1:1 bijection between ledger product ids and
//! mirror record ids.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::IdMapping;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const MAPPING_TABLE: &str = "id_mapping";

#[derive(Clone)]
pub struct MappingRepository {
    base: BaseRepository,
}

impl MappingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Insert a mapping row; both sides must be new
    pub async fn insert(&self, ledger_id: u64, mirror_id: RecordId) -> RepoResult<IdMapping> {
        if self.find_by_ledger_id(ledger_id).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Mapping for ledger id {ledger_id} already exists"
            )));
        }

        let created: Option<IdMapping> = self
            .base
            .db()
            .create(MAPPING_TABLE)
            .content(IdMapping {
                id: None,
                ledger_id,
                mirror_id,
            })
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create id mapping".to_string()))
    }

    pub async fn find_by_ledger_id(&self, ledger_id: u64) -> RepoResult<Option<IdMapping>> {
        let mapping: Option<IdMapping> = self
            .base
            .db()
            .query("SELECT * FROM id_mapping WHERE ledger_id = $ledger_id LIMIT 1")
            .bind(("ledger_id", ledger_id))
            .await?
            .take(0)?;
        Ok(mapping)
    }

    pub async fn find_by_mirror_id(&self, mirror_id: &RecordId) -> RepoResult<Option<IdMapping>> {
        let mapping: Option<IdMapping> = self
            .base
            .db()
            .query("SELECT * FROM id_mapping WHERE mirror_id = $mirror_id LIMIT 1")
            .bind(("mirror_id", mirror_id.clone()))
            .await?
            .take(0)?;
        Ok(mapping)
    }

    /// Remove the row for a ledger id; no-op when absent
    pub async fn delete_by_ledger_id(&self, ledger_id: u64) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE id_mapping WHERE ledger_id = $ledger_id")
            .bind(("ledger_id", ledger_id))
            .await?;
        Ok(())
    }

    pub async fn find_all(&self) -> RepoResult<Vec<IdMapping>> {
        let mappings: Vec<IdMapping> = self
            .base
            .db()
            .query("SELECT * FROM id_mapping ORDER BY ledger_id")
            .await?
            .take(0)?;
        Ok(mappings)
    }
}
