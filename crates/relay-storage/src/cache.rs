//! Record cache trait

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StorageResult;
use crate::record::ResourceRecord;

/// Fast-path cache in front of the durable record store.
///
/// Keyed by the encoded unified resource id. Deletion is expressed as a
/// `tombstone` write (set the key to an explicit empty value) rather than an
/// eviction, so a reader racing a delete observes "absent" instead of falling
/// back to a row that is about to disappear.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Get a cached record. A tombstoned key reads as `None`.
    async fn get(&self, key: &str) -> StorageResult<Option<ResourceRecord>>;

    /// Cache a record with an optional TTL.
    async fn put(
        &self,
        key: &str,
        record: &ResourceRecord,
        ttl: Option<Duration>,
    ) -> StorageResult<()>;

    /// Overwrite the entry with an explicit empty value.
    async fn tombstone(&self, key: &str) -> StorageResult<()>;
}
