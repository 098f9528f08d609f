//! In-process record cache

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cache::RecordCache;
use crate::error::StorageResult;
use crate::record::ResourceRecord;

/// In-memory record cache for tests and single-node deployments.
///
/// A `None` entry is a tombstone. TTLs are not enforced; entries live for the
/// lifetime of the process.
#[derive(Default)]
pub struct MemoryRecordCache {
    entries: RwLock<HashMap<String, Option<ResourceRecord>>>,
}

impl MemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordCache for MemoryRecordCache {
    async fn get(&self, key: &str) -> StorageResult<Option<ResourceRecord>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned().flatten())
    }

    async fn put(
        &self,
        key: &str,
        record: &ResourceRecord,
        _ttl: Option<Duration>,
    ) -> StorageResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Some(record.clone()));
        Ok(())
    }

    async fn tombstone(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), None);
        Ok(())
    }
}
