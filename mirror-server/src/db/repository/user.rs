//! User Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{User, UserContent};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user: Option<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username.to_string()))
            .await?
            .take(0)?;
        Ok(user)
    }

    /// Number of registered users (drives ledger account assignment)
    pub async fn count(&self) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await?;

        #[derive(serde::Deserialize)]
        struct Count {
            total: u64,
        }

        let count: Option<Count> = result.take(0)?;
        Ok(count.map(|c| c.total).unwrap_or(0))
    }

    pub async fn create(&self, content: UserContent) -> RepoResult<User> {
        if self.find_by_username(&content.username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username {} already taken",
                content.username
            )));
        }

        let created: Option<User> = self.base.db().create(USER_TABLE).content(content).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }
}
