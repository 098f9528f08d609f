//! # relay-storage
//!
//! The two storage tiers behind the unified resource layer:
//!
//! - A record cache (Redis, or in-process memory for tests) on the fast path
//! - A durable SQLite store (sqlx) as the source of truth
//!
//! Plus the API key table that identifies calling principals.

mod api_keys;
mod cache;
mod error;
mod memory_cache;
mod record;
mod records;
mod redis_cache;

pub use api_keys::ApiKey;
pub use cache::RecordCache;
pub use error::{StorageError, StorageResult};
pub use memory_cache::MemoryRecordCache;
pub use record::ResourceRecord;
pub use records::RecordStore;
pub use redis_cache::RedisRecordCache;
