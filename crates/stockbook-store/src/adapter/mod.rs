//! # Durable Store Adapters
//!
//! The boundary between the in-memory cache and on-device persistence.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     DurableStore contract                               │
//! │                                                                         │
//! │  load_all(collection)          → every record, in stored order         │
//! │                                  (empty if never written)               │
//! │  replace_all(collection, recs) → clear + rewrite, all or nothing       │
//! │  get_meta(key)                 → value | None                          │
//! │  set_meta(key, value)          → upsert                                │
//! │                                                                         │
//! │  Implementations                                                        │
//! │  ├── SqliteStore  (sqlite.rs)  one table per collection + meta         │
//! │  └── MemoryStore  (memory.rs)  tests, ephemeral runs                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The adapter owns no state of its own: it is the mirror target of the
//! cache. Records cross this boundary as JSON values so an adapter never
//! needs to know the entity types.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use stockbook_core::Collection;

use crate::error::{StoreError, StoreResult};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// =============================================================================
// Metadata Keys
// =============================================================================

/// JSON-encoded [`stockbook_core::AppSettings`].
pub const META_APP_SETTINGS: &str = "app_settings";

/// JSON-encoded [`stockbook_core::CompanyInfo`].
pub const META_COMPANY_INFO: &str = "company_info";

/// RFC 3339 timestamp of the most recent backup.
pub const META_LAST_BACKUP: &str = "last_backup_date";

/// Present once first-run seeding has been decided.
pub const META_FIRST_RUN_COMPLETE: &str = "first_run_complete";

// =============================================================================
// Durable Store Trait
// =============================================================================

/// Per-collection durable backend.
///
/// Used as `Arc<dyn DurableStore>` so the backend is picked when the ledger
/// is composed, never by branching inside repositories.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;

    /// Loads every record of a collection in stored order.
    async fn load_all(&self, collection: Collection) -> StoreResult<Vec<Value>>;

    /// Atomically replaces the whole collection.
    ///
    /// Either every record is written or the previous contents remain;
    /// a partial failure never leaves duplicate or stale records.
    async fn replace_all(&self, collection: Collection, records: Vec<Value>) -> StoreResult<()>;

    async fn get_meta(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_meta(&self, key: &str, value: String) -> StoreResult<()>;
}

/// Extracts the string `id` of every record, failing on the first record
/// that has none.
pub(crate) fn record_ids(collection: Collection, records: &[Value]) -> StoreResult<Vec<String>> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            record
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .ok_or(StoreError::MissingId {
                    collection,
                    position,
                })
        })
        .collect()
}
