//! Counter Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Counter;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct CounterRepository {
    base: BaseRepository,
}

impl CounterRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Atomically increment and return the named sequence.
    /// Creates the counter at 1 on first use.
    pub async fn next(&self, name: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "UPSERT type::thing('counter', $name) SET name = $name, seq += 1 RETURN AFTER",
            )
            .bind(("name", name.to_string()))
            .await?;
        let counters: Vec<Counter> = result.take(0)?;
        counters
            .into_iter()
            .next()
            .map(|c| c.seq)
            .ok_or_else(|| RepoError::Database(format!("Failed to increment counter {name}")))
    }

    /// Current value without incrementing; 0 when the counter is unused
    pub async fn current(&self, name: &str) -> RepoResult<u64> {
        let counter: Option<Counter> = self
            .base
            .db()
            .query("SELECT * FROM type::thing('counter', $name)")
            .bind(("name", name.to_string()))
            .await?
            .take(0)?;
        Ok(counter.map(|c| c.seq).unwrap_or(0))
    }
}
