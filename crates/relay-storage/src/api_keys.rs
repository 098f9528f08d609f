//! API key storage
//!
//! Keys are stored argon2-hashed; the first 8 characters are kept in clear as
//! a lookup prefix so validation scans a handful of candidates at most.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::Write as _;

use crate::error::{StorageError, StorageResult};
use crate::records::RecordStore;

/// API Key record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub created_at: DateTime<Utc>,
    pub enabled: bool,
}

impl RecordStore {
    /// Generate a new API key and return it (only shown once)
    pub async fn create_api_key(&self, name: &str) -> StorageResult<(ApiKey, String)> {
        let id = uuid::Uuid::new_v4().to_string();
        let raw_key = generate_api_key();
        let key_prefix = raw_key[..8].to_string();
        let key_hash = hash_api_key(&raw_key)?;

        let api_key = ApiKey {
            id: id.clone(),
            name: name.to_string(),
            key_hash,
            key_prefix,
            created_at: Utc::now(),
            enabled: true,
        };

        sqlx::query(
            r#"
            INSERT INTO api_keys (id, name, key_hash, key_prefix, created_at, enabled)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&api_key.id)
        .bind(&api_key.name)
        .bind(&api_key.key_hash)
        .bind(&api_key.key_prefix)
        .bind(api_key.created_at)
        .bind(api_key.enabled)
        .execute(self.pool())
        .await?;

        Ok((api_key, raw_key))
    }

    /// Validate an API key and return the key record if valid
    pub async fn validate_api_key(&self, raw_key: &str) -> StorageResult<ApiKey> {
        if raw_key.len() < 8 {
            return Err(StorageError::InvalidApiKey);
        }
        let prefix = &raw_key[..8];

        let candidates = sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, name, key_hash, key_prefix, created_at, enabled
            FROM api_keys
            WHERE key_prefix = ? AND enabled = 1
            "#,
        )
        .bind(prefix)
        .fetch_all(self.pool())
        .await?;

        for key in candidates {
            if verify_api_key(raw_key, &key.key_hash)? {
                return Ok(key);
            }
        }

        Err(StorageError::InvalidApiKey)
    }

    /// Whether any API keys exist (used for first-run bootstrap)
    pub async fn has_api_keys(&self) -> StorageResult<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM api_keys")
            .fetch_one(self.pool())
            .await?;
        Ok(count.0 > 0)
    }

    /// Revoke (delete) an API key
    pub async fn revoke_api_key(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("API key {id}")));
        }

        Ok(())
    }
}

/// Generate a random API key (sk-...)
fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    let mut hex = String::with_capacity(64);
    for byte in bytes {
        let _ = write!(hex, "{byte:02x}");
    }
    format!("sk-{hex}")
}

/// Hash an API key using argon2
fn hash_api_key(key: &str) -> StorageResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(key.as_bytes(), &salt)
        .map_err(|e| StorageError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify an API key against a hash
fn verify_api_key(key: &str, hash: &str) -> StorageResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| StorageError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(key.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_key_lifecycle() {
        let store = RecordStore::in_memory().await.unwrap();
        assert!(!store.has_api_keys().await.unwrap());

        let (key, raw_key) = store.create_api_key("Test Key").await.unwrap();
        assert_eq!(key.name, "Test Key");
        assert!(key.enabled);
        assert!(raw_key.starts_with("sk-"));
        assert!(store.has_api_keys().await.unwrap());

        let validated = store.validate_api_key(&raw_key).await.unwrap();
        assert_eq!(validated.id, key.id);

        assert!(store.validate_api_key("sk-bogus-key").await.is_err());

        store.revoke_api_key(&key.id).await.unwrap();
        assert!(store.validate_api_key(&raw_key).await.is_err());
    }
}
