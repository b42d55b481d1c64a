//! User Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// User role: the contract owner mutates the catalog, buyers place orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Buyer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Buyer => "buyer",
        }
    }
}

/// User account in the mirror store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub username: String,
    /// argon2id PHC string; never leaves the server
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Ledger account this user signs transactions with, assigned by
    /// registration order
    pub user_address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Insert payload (carries the hash, unlike the read model)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContent {
    pub username: String,
    pub password_hash: String,
    pub user_address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.password_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = User::hash_password("hunter2").expect("hashing failed");
        let user = User {
            id: None,
            username: "alice".into(),
            password_hash: hash,
            user_address: "0x0".into(),
            role: Role::Buyer,
            created_at: Utc::now(),
        };

        assert!(user.verify_password("hunter2").unwrap());
        assert!(!user.verify_password("wrong").unwrap());
    }
}
