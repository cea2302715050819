//! # SQLite Durable Store
//!
//! One table per collection holding ordered JSON payloads, plus a `meta`
//! key-value table.
//!
//! ## Replace-All
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  replace_all(products, [p1, p2, p3])                                   │
//! │                                                                         │
//! │  1. extract ids (reject record without id, nothing touched)            │
//! │  2. BEGIN                                                              │
//! │  3. DELETE FROM products                                               │
//! │  4. INSERT (p1.id, 0, p1) (p2.id, 1, p2) (p3.id, 2, p3)                │
//! │  5. COMMIT        ← any error before this rolls back to old contents   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use stockbook_core::Collection;
use tracing::{debug, warn};

use super::{record_ids, DurableStore};
use crate::error::StoreResult;

/// [`DurableStore`] backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    /// Number of stored records in a collection.
    pub async fn count(&self, collection: Collection) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.name());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        // Table names come from the Collection enum, never from input.
        let sql = format!(
            "SELECT payload FROM {} ORDER BY position",
            collection.name()
        );

        let payloads: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match serde_json::from_str(&payload) {
                Ok(value) => records.push(value),
                Err(e) => warn!(%collection, error = %e, "Skipping unreadable payload"),
            }
        }

        debug!(%collection, count = records.len(), "Loaded collection");
        Ok(records)
    }

    async fn replace_all(&self, collection: Collection, records: Vec<Value>) -> StoreResult<()> {
        let ids = record_ids(collection, &records)?;
        let table = collection.name();
        let insert = format!(
            "INSERT INTO {} (id, position, payload) VALUES (?1, ?2, ?3)",
            table
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?;

        for (position, (id, record)) in ids.iter().zip(&records).enumerate() {
            sqlx::query(&insert)
                .bind(id)
                .bind(position as i64)
                .bind(serde_json::to_string(record)?)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(%collection, count = records.len(), "Replaced collection");
        Ok(())
    }

    async fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn set_meta(&self, key: &str, value: String) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO meta (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(key, "Metadata updated");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    async fn store() -> SqliteStore {
        Database::new(DbConfig::in_memory()).await.unwrap().store()
    }

    #[tokio::test]
    async fn test_unwritten_collection_is_empty() {
        let store = store().await;
        assert!(store.load_all(Collection::Employees).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_all_preserves_order_and_replaces() {
        let store = store().await;

        let first = vec![json!({"id": "b", "n": 1}), json!({"id": "a", "n": 2})];
        store.replace_all(Collection::Products, first.clone()).await.unwrap();
        assert_eq!(store.load_all(Collection::Products).await.unwrap(), first);

        let second = vec![json!({"id": "c", "n": 3})];
        store.replace_all(Collection::Products, second.clone()).await.unwrap();
        assert_eq!(store.load_all(Collection::Products).await.unwrap(), second);
        assert_eq!(store.count(Collection::Products).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_contents() {
        let store = store().await;

        let original = vec![json!({"id": "1"})];
        store.replace_all(Collection::Invoices, original.clone()).await.unwrap();

        // Duplicate id fails mid-transaction
        let bad = vec![json!({"id": "x"}), json!({"id": "x"})];
        let err = store.replace_all(Collection::Invoices, bad).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));

        assert_eq!(store.load_all(Collection::Invoices).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_missing_id_rejected_before_write() {
        let store = store().await;

        let original = vec![json!({"id": "1"})];
        store.replace_all(Collection::Customers, original.clone()).await.unwrap();

        let bad = vec![json!({"name": "anonymous"})];
        assert!(store.replace_all(Collection::Customers, bad).await.is_err());
        assert_eq!(store.load_all(Collection::Customers).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_meta_upsert() {
        let store = store().await;

        assert_eq!(store.get_meta("last_backup_date").await.unwrap(), None);

        store.set_meta("last_backup_date", "a".into()).await.unwrap();
        store.set_meta("last_backup_date", "b".into()).await.unwrap();

        assert_eq!(
            store.get_meta("last_backup_date").await.unwrap().as_deref(),
            Some("b")
        );
    }
}
