//! Redis record cache implementation

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::RecordCache;
use crate::error::{StorageError, StorageResult};
use crate::record::ResourceRecord;

/// Redis-backed record cache.
///
/// Values are JSON; a tombstone is the literal `null`, which deserializes to
/// `None` on read.
pub struct RedisRecordCache {
    conn: ConnectionManager,
}

impl RedisRecordCache {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        info!(url = %url, "Connecting to Redis record cache");

        let client = Client::open(url).map_err(|e| StorageError::Cache(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StorageError::Cache(e.to_string()))?;

        info!("Connected to Redis record cache");

        Ok(Self { conn })
    }
}

#[async_trait]
impl RecordCache for RedisRecordCache {
    async fn get(&self, key: &str) -> StorageResult<Option<ResourceRecord>> {
        let mut conn = self.conn.clone();

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| StorageError::Cache(e.to_string()))?;

        match value {
            Some(v) => {
                // A tombstoned key holds `null` and parses to None
                let parsed: Option<ResourceRecord> = serde_json::from_str(&v)?;
                Ok(parsed)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        record: &ResourceRecord,
        ttl: Option<Duration>,
    ) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(record)?;

        debug!(key = %key, ttl = ?ttl, "Caching resource record");

        if let Some(ttl) = ttl {
            conn.set_ex(key, &serialized, ttl.as_secs())
                .await
                .map_err(|e| StorageError::Cache(e.to_string()))
        } else {
            conn.set(key, &serialized)
                .await
                .map_err(|e| StorageError::Cache(e.to_string()))
        }
    }

    async fn tombstone(&self, key: &str) -> StorageResult<()> {
        let mut conn = self.conn.clone();

        debug!(key = %key, "Tombstoning resource record");

        conn.set(key, "null")
            .await
            .map_err(|e| StorageError::Cache(e.to_string()))
    }
}
