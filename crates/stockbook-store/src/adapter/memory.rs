//! In-process [`DurableStore`] for tests and ephemeral runs.
//!
//! Besides holding data it can be told to fail (`set_failing`) and counts
//! `replace_all` calls, which is how tests observe the write-through.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use stockbook_core::Collection;

use super::{record_ids, DurableStore};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Value>>>,
    meta: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    replace_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful `replace_all` calls so far.
    pub fn replace_count(&self) -> usize {
        self.replace_count.load(Ordering::SeqCst)
    }

    /// Records currently stored for a collection, without going through the
    /// async trait.
    pub fn records(&self, collection: Collection) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        self.check()?;
        Ok(self.records(collection))
    }

    async fn replace_all(&self, collection: Collection, records: Vec<Value>) -> StoreResult<()> {
        self.check()?;
        record_ids(collection, &records)?;

        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection, records);
        self.replace_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(self
            .meta
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set_meta(&self, key: &str, value: String) -> StoreResult<()> {
        self.check()?;
        self.meta
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replace_and_load() {
        let store = MemoryStore::new();
        store
            .replace_all(Collection::Products, vec![json!({"id": "1"})])
            .await
            .unwrap();

        assert_eq!(store.load_all(Collection::Products).await.unwrap().len(), 1);
        assert!(store.load_all(Collection::Invoices).await.unwrap().is_empty());
        assert_eq!(store.replace_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.set_failing(true);

        assert!(store.set_meta("k", "v".into()).await.is_err());
        assert!(store
            .replace_all(Collection::Products, vec![])
            .await
            .is_err());
        assert_eq!(store.replace_count(), 0);

        store.set_failing(false);
        assert!(store.set_meta("k", "v".into()).await.is_ok());
    }
}
