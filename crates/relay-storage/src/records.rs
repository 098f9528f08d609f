//! Durable resource record storage (SQLite)
//!
//! Source of truth for unified resource records. One table per managed
//! resource kind, all with the same shape, keyed by the encoded unified id.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use std::collections::HashMap;
use tracing::warn;

use crate::error::StorageResult;
use crate::record::ResourceRecord;

/// Raw row as stored; JSON columns are TEXT
#[derive(Debug, FromRow)]
struct ResourceRow {
    unified_resource_id: String,
    resource_type: String,
    model_mappings: String,
    flat_model_resource_ids: String,
    resource_object: String,
    storage_backend: Option<String>,
    storage_url: Option<String>,
    created_by: String,
    updated_by: String,
    created_at: DateTime<Utc>,
}

impl ResourceRow {
    fn parse(self) -> StorageResult<ResourceRecord> {
        let model_mappings: HashMap<String, String> = serde_json::from_str(&self.model_mappings)?;
        let flat_model_resource_ids: Vec<String> =
            serde_json::from_str(&self.flat_model_resource_ids)?;
        let resource_object: serde_json::Value = serde_json::from_str(&self.resource_object)?;

        Ok(ResourceRecord {
            unified_resource_id: self.unified_resource_id,
            resource_type: self.resource_type,
            resource_object,
            model_mappings,
            flat_model_resource_ids,
            storage_backend: self.storage_backend,
            storage_url: self.storage_url,
            created_by: self.created_by,
            updated_by: self.updated_by,
            created_at: self.created_at,
        })
    }
}

/// Storage handle for SQLite operations
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Create a new store with the given database URL
    pub async fn new(database_url: &str) -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// Single connection: every connection to `sqlite::memory:` opens its own
    /// database.
    pub async fn in_memory() -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run base migrations (tables not tied to a resource kind)
    async fn run_migrations(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                key_hash TEXT NOT NULL,
                key_prefix TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                enabled INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create the table for one managed resource kind if it does not exist.
    /// Called once per registered adapter at startup.
    pub async fn ensure_resource_table(&self, table: &str) -> StorageResult<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                unified_resource_id TEXT PRIMARY KEY,
                resource_type TEXT NOT NULL,
                model_mappings TEXT NOT NULL,
                flat_model_resource_ids TEXT NOT NULL,
                resource_object TEXT NOT NULL,
                storage_backend TEXT,
                storage_url TEXT,
                created_by TEXT NOT NULL,
                updated_by TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE INDEX IF NOT EXISTS idx_{table}_owner_created
            ON {table}(created_by, created_at)
            "#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a resource record
    pub async fn insert_record(&self, table: &str, record: &ResourceRecord) -> StorageResult<()> {
        let model_mappings = serde_json::to_string(&record.model_mappings)?;
        let flat_ids = serde_json::to_string(&record.flat_model_resource_ids)?;
        let resource_object = serde_json::to_string(&record.resource_object)?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {table}
                (unified_resource_id, resource_type, model_mappings, flat_model_resource_ids,
                 resource_object, storage_backend, storage_url, created_by, updated_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        ))
        .bind(&record.unified_resource_id)
        .bind(&record.resource_type)
        .bind(&model_mappings)
        .bind(&flat_ids)
        .bind(&resource_object)
        .bind(&record.storage_backend)
        .bind(&record.storage_url)
        .bind(&record.created_by)
        .bind(&record.updated_by)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Point lookup by unified id
    pub async fn get_record(
        &self,
        table: &str,
        unified_resource_id: &str,
    ) -> StorageResult<Option<ResourceRecord>> {
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            SELECT unified_resource_id, resource_type, model_mappings, flat_model_resource_ids,
                   resource_object, storage_backend, storage_url, created_by, updated_by, created_at
            FROM {table}
            WHERE unified_resource_id = ?
            "#
        ))
        .bind(unified_resource_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResourceRow::parse).transpose()
    }

    /// Point delete. Returns whether a row was removed.
    pub async fn delete_record(
        &self,
        table: &str,
        unified_resource_id: &str,
    ) -> StorageResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE unified_resource_id = ?"
        ))
        .bind(unified_resource_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Owner-filtered scan, newest first, with an optional `id > after`
    /// cursor. Fetches one row past `limit` to compute `has_more`. Rows that
    /// fail to parse are skipped with a warning.
    pub async fn list_records(
        &self,
        table: &str,
        created_by: &str,
        limit: i64,
        after: Option<&str>,
    ) -> StorageResult<(Vec<ResourceRecord>, bool)> {
        let rows = match after {
            Some(after) => {
                sqlx::query_as::<_, ResourceRow>(&format!(
                    r#"
                    SELECT unified_resource_id, resource_type, model_mappings,
                           flat_model_resource_ids, resource_object, storage_backend,
                           storage_url, created_by, updated_by, created_at
                    FROM {table}
                    WHERE created_by = ? AND unified_resource_id > ?
                    ORDER BY created_at DESC
                    LIMIT ?
                    "#
                ))
                .bind(created_by)
                .bind(after)
                .bind(limit + 1)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ResourceRow>(&format!(
                    r#"
                    SELECT unified_resource_id, resource_type, model_mappings,
                           flat_model_resource_ids, resource_object, storage_backend,
                           storage_url, created_by, updated_by, created_at
                    FROM {table}
                    WHERE created_by = ?
                    ORDER BY created_at DESC
                    LIMIT ?
                    "#
                ))
                .bind(created_by)
                .bind(limit + 1)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let has_more = rows.len() as i64 > limit;
        let mut records = Vec::with_capacity(rows.len().min(limit as usize));
        for row in rows.into_iter().take(limit as usize) {
            let id = row.unified_resource_id.clone();
            match row.parse() {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(unified_resource_id = %id, error = %e, "Skipping unparseable resource row");
                }
            }
        }

        Ok((records, has_more))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ResourceRecord;
    use std::collections::HashMap;

    const TABLE: &str = "managed_vector_stores";

    fn record(id: &str, owner: &str) -> ResourceRecord {
        let mut mappings = HashMap::new();
        mappings.insert("dep1".to_string(), format!("vs_{id}"));
        let flat = ResourceRecord::flatten_mappings(&mappings);
        ResourceRecord {
            unified_resource_id: id.to_string(),
            resource_type: "vector_store".to_string(),
            resource_object: serde_json::json!({"id": format!("vs_{id}"), "object": "vector_store"}),
            model_mappings: mappings,
            flat_model_resource_ids: flat,
            storage_backend: None,
            storage_url: None,
            created_by: owner.to_string(),
            updated_by: owner.to_string(),
            created_at: Utc::now(),
        }
    }

    async fn store() -> RecordStore {
        let store = RecordStore::in_memory().await.unwrap();
        store.ensure_resource_table(TABLE).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let store = store().await;

        let rec = record("X", "u1");
        store.insert_record(TABLE, &rec).await.unwrap();

        let fetched = store.get_record(TABLE, "X").await.unwrap().unwrap();
        assert_eq!(fetched.model_mappings, rec.model_mappings);
        assert_eq!(fetched.created_by, "u1");
        assert_eq!(fetched.resource_object, rec.resource_object);

        assert!(store.delete_record(TABLE, "X").await.unwrap());
        assert!(store.get_record(TABLE, "X").await.unwrap().is_none());
        assert!(!store.delete_record(TABLE, "X").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = store().await;

        for (i, owner) in [("a", "u1"), ("b", "u1"), ("c", "u1"), ("d", "u2")] {
            let mut rec = record(i, owner);
            // Spread creation times so newest-first ordering is deterministic
            rec.created_at = Utc::now() + chrono::Duration::seconds(i.as_bytes()[0] as i64);
            store.insert_record(TABLE, &rec).await.unwrap();
        }

        let (page, has_more) = store.list_records(TABLE, "u1", 2, None).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(has_more);
        assert!(page.iter().all(|r| r.created_by == "u1"));
        // Newest first
        assert_eq!(page[0].unified_resource_id, "c");
        assert_eq!(page[1].unified_resource_id, "b");

        let (rest, has_more) = store.list_records(TABLE, "u1", 2, Some("b")).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert!(!has_more);
        assert_eq!(rest[0].unified_resource_id, "c");
    }

    #[tokio::test]
    async fn test_unparseable_row_skipped() {
        let store = store().await;
        store.insert_record(TABLE, &record("ok", "u1")).await.unwrap();

        // Corrupt one row's JSON directly
        sqlx::query(&format!(
            "INSERT INTO {TABLE} (unified_resource_id, resource_type, model_mappings, \
             flat_model_resource_ids, resource_object, created_by, updated_by, created_at) \
             VALUES ('bad', 'vector_store', 'not json', '[]', '{{}}', 'u1', 'u1', datetime('now'))"
        ))
        .execute(store.pool())
        .await
        .unwrap();

        let (page, _) = store.list_records(TABLE, "u1", 20, None).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].unified_resource_id, "ok");
    }
}
