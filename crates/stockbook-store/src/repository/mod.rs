//! # Repository Module
//!
//! Typed operations over the ledger cache, one repository per collection.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  ledger.invoices().add(invoice)                                │
//! │       ▼                                                                 │
//! │  InvoiceRepository (stateless, holds a cache handle)                   │
//! │  ├── get_all / get_by_id / count      (CollectionRepository)           │
//! │  ├── add / update / delete            (posting-aware overrides)        │
//! │       │                                                                 │
//! │       │  cache.write(|state, changes| ...)                             │
//! │       ▼                                                                 │
//! │  LedgerCache ──► write-through ──► DurableStore                        │
//! │                                                                         │
//! │  Repositories never talk to the durable store directly.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Semantics shared by every collection
//! - `add` assigns a fresh id (the caller's id is ignored) and appends
//! - `update` replaces the whole record with the same id; unknown id is a
//!   no-op
//! - `delete` removes by id; unknown id is a no-op
//! - every call returns the collection as it is after the call
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Stock, low-stock list, manual adjustments
//! - [`CustomerRepository`] - Customers and suppliers, balances
//! - [`InvoiceRepository`] - Invoices with the posting protocol
//! - [`TransactionRepository`] - The ledger
//! - [`ProposalRepository`] - Quotes and conversion to invoices
//! - [`EmployeeRepository`] - Staff and salary payments
//! - [`SettingsRepository`] - App settings and company singletons

pub mod customer;
pub mod employee;
pub mod invoice;
pub mod product;
pub mod proposal;
pub mod settings;
pub mod transaction;

pub use customer::CustomerRepository;
pub use employee::EmployeeRepository;
pub use invoice::InvoiceRepository;
pub use product::ProductRepository;
pub use proposal::ProposalRepository;
pub use settings::SettingsRepository;
pub use transaction::TransactionRepository;

use stockbook_core::{generate_id, Entity};
use tracing::debug;

use crate::cache::{CacheState, Cached, Changes, LedgerCache};

/// CRUD over one cached collection.
///
/// Everything is synchronous: reads come straight from memory and writes
/// return before the write-through reaches the durable store.
pub trait CollectionRepository {
    type Record: Cached;

    fn cache(&self) -> &LedgerCache;

    fn get_all(&self) -> Vec<Self::Record> {
        self.cache().read(|state| <Self::Record as Cached>::list(state).clone())
    }

    fn get_by_id(&self, id: &str) -> Option<Self::Record> {
        self.cache()
            .read(|state| <Self::Record as Cached>::list(state).iter().find(|r| r.id() == id).cloned())
    }

    fn count(&self) -> usize {
        self.cache().read(|state| <Self::Record as Cached>::list(state).len())
    }

    /// Appends `record` under a newly generated id.
    fn add(&self, record: Self::Record) -> Vec<Self::Record> {
        self.cache().write(|state, changes| {
            insert_record(state, changes, record);
            <Self::Record as Cached>::list(state).clone()
        })
    }

    /// Replaces the record with the same id. Unknown ids are ignored.
    fn update(&self, record: Self::Record) -> Vec<Self::Record> {
        self.cache().write(|state, changes| {
            replace_record(state, changes, record);
            <Self::Record as Cached>::list(state).clone()
        })
    }

    /// Removes the record with `id`. Unknown ids are ignored.
    fn delete(&self, id: &str) -> Vec<Self::Record> {
        self.cache().write(|state, changes| {
            remove_record::<Self::Record>(state, changes, id);
            <Self::Record as Cached>::list(state).clone()
        })
    }
}

// =============================================================================
// Shared Mutation Helpers
// =============================================================================
// These run inside `LedgerCache::write`, so several of them can be combined
// into one atomic mutation (e.g. invoice + products + transaction).

/// Assigns a fresh id, appends, and returns the id.
pub(crate) fn insert_record<T: Cached>(
    state: &mut CacheState,
    changes: &mut Changes,
    mut record: T,
) -> String {
    let id = generate_id();
    record.set_id(id.clone());
    T::list_mut(state).push(record);
    changes.touch(T::COLLECTION);

    debug!(collection = %T::COLLECTION, id = %id, "Record added");
    id
}

/// Replaces the record with the same id, returning the previous version.
pub(crate) fn replace_record<T: Cached>(
    state: &mut CacheState,
    changes: &mut Changes,
    record: T,
) -> Option<T> {
    let list = T::list_mut(state);
    let Some(slot) = list.iter_mut().find(|r| r.id() == record.id()) else {
        debug!(collection = %T::COLLECTION, id = %record.id(), "Update of unknown id ignored");
        return None;
    };

    let previous = std::mem::replace(slot, record);
    changes.touch(T::COLLECTION);

    debug!(collection = %T::COLLECTION, id = %previous.id(), "Record updated");
    Some(previous)
}

/// Removes the record with `id`, returning it.
pub(crate) fn remove_record<T: Cached>(
    state: &mut CacheState,
    changes: &mut Changes,
    id: &str,
) -> Option<T> {
    let list = T::list_mut(state);
    let Some(index) = list.iter().position(|r| r.id() == id) else {
        debug!(collection = %T::COLLECTION, id, "Delete of unknown id ignored");
        return None;
    };

    let removed = list.remove(index);
    changes.touch(T::COLLECTION);

    debug!(collection = %T::COLLECTION, id, "Record deleted");
    Some(removed)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::adapter::MemoryStore;
    use crate::cache::LedgerCache;
    use crate::seed::{DemoSeed, NoSeed};
    use crate::sink::WriteThrough;

    /// Initialized cache over a memory store, empty or with demo data.
    pub async fn cache(seeded: bool) -> (LedgerCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = LedgerCache::new(WriteThrough::spawn(store.clone()));
        if seeded {
            cache.init(store.as_ref(), &DemoSeed).await.unwrap();
        } else {
            cache.init(store.as_ref(), &NoSeed).await.unwrap();
        }
        (cache, store)
    }
}
