//! # Ledger Cache
//!
//! The fully materialized, synchronously readable mirror of every
//! collection. Repositories are thin views over this cache.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cache Lifecycle                                  │
//! │                                                                         │
//! │  LedgerCache::new(sink)          empty, not initialized                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  init(store, seed).await                                               │
//! │   1. flush pending write-through                                       │
//! │   2. load_all for every collection (skip undecodable records)          │
//! │   3. products empty AND no first_run_complete flag?                    │
//! │        yes → write seed collections directly (awaited), set flag       │
//! │   4. load settings / company / last backup from meta (or defaults)     │
//! │   5. swap into memory                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository calls (sync)  ──► mutate + enqueue write-through           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ledger::shutdown → sink drained                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! A single `Mutex<CacheState>` guards all collections, so a posting that
//! touches invoices, products and transactions is observed as one unit.
//! Write-through ops are enqueued before the lock is released, which keeps
//! durable order identical to in-memory order.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stockbook_core::{
    AppSettings, Collection, CompanyInfo, Customer, Employee, Entity, Invoice, Product, Proposal,
    Transaction,
};
use tracing::{debug, error, info, warn};

use crate::adapter::{
    DurableStore, META_APP_SETTINGS, META_COMPANY_INFO, META_FIRST_RUN_COMPLETE, META_LAST_BACKUP,
};
use crate::error::StoreResult;
use crate::repository::{
    CustomerRepository, EmployeeRepository, InvoiceRepository, ProductRepository,
    ProposalRepository, SettingsRepository, TransactionRepository,
};
use crate::seed::SeedProvider;
use crate::sink::WriteThrough;

// =============================================================================
// Cache State
// =============================================================================

/// Everything the cache holds in memory.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    pub products: Vec<Product>,
    pub invoices: Vec<Invoice>,
    pub transactions: Vec<Transaction>,
    pub customers: Vec<Customer>,
    pub proposals: Vec<Proposal>,
    pub employees: Vec<Employee>,
    pub settings: AppSettings,
    pub company: CompanyInfo,
    pub last_backup: Option<DateTime<Utc>>,
}

impl CacheState {
    /// Serializes one collection for the durable store.
    fn records(&self, collection: Collection) -> Result<Vec<Value>, serde_json::Error> {
        match collection {
            Collection::Products => to_values(&self.products),
            Collection::Invoices => to_values(&self.invoices),
            Collection::Transactions => to_values(&self.transactions),
            Collection::Customers => to_values(&self.customers),
            Collection::Proposals => to_values(&self.proposals),
            Collection::Employees => to_values(&self.employees),
        }
    }

    /// Total records across all collections.
    pub fn record_count(&self) -> usize {
        self.products.len()
            + self.invoices.len()
            + self.transactions.len()
            + self.customers.len()
            + self.proposals.len()
            + self.employees.len()
    }
}

fn to_values<T: Serialize>(records: &[T]) -> Result<Vec<Value>, serde_json::Error> {
    records.iter().map(serde_json::to_value).collect()
}

/// An entity whose collection lives in [`CacheState`].
pub trait Cached: Entity {
    fn list(state: &CacheState) -> &Vec<Self>;
    fn list_mut(state: &mut CacheState) -> &mut Vec<Self>;
}

macro_rules! impl_cached {
    ($ty:ty, $field:ident) => {
        impl Cached for $ty {
            fn list(state: &CacheState) -> &Vec<Self> {
                &state.$field
            }

            fn list_mut(state: &mut CacheState) -> &mut Vec<Self> {
                &mut state.$field
            }
        }
    };
}

impl_cached!(Product, products);
impl_cached!(Invoice, invoices);
impl_cached!(Transaction, transactions);
impl_cached!(Customer, customers);
impl_cached!(Proposal, proposals);
impl_cached!(Employee, employees);

// =============================================================================
// Change Tracking
// =============================================================================

/// Collections and metadata touched by one mutation.
///
/// Each touched collection produces exactly one write-through once the
/// mutation finishes.
#[derive(Debug, Default)]
pub struct Changes {
    collections: Vec<Collection>,
    meta: Vec<(&'static str, String)>,
}

impl Changes {
    pub fn touch(&mut self, collection: Collection) {
        if !self.collections.contains(&collection) {
            self.collections.push(collection);
        }
    }

    pub fn set_meta(&mut self, key: &'static str, value: String) {
        self.meta.push((key, value));
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.meta.is_empty()
    }
}

// =============================================================================
// Ledger Cache
// =============================================================================

#[derive(Debug)]
struct Inner {
    state: Mutex<CacheState>,
    initialized: Mutex<bool>,
}

/// Shared cache handle. Cheap to clone; every clone sees the same state.
#[derive(Debug, Clone)]
pub struct LedgerCache {
    inner: Arc<Inner>,
    sink: WriteThrough,
}

impl LedgerCache {
    /// Creates an empty, uninitialized cache writing through `sink`.
    pub fn new(sink: WriteThrough) -> Self {
        LedgerCache {
            inner: Arc::new(Inner {
                state: Mutex::new(CacheState::default()),
                initialized: Mutex::new(false),
            }),
            sink,
        }
    }

    /// Hydrates the cache from `store`, seeding on the very first run.
    ///
    /// Safe to call more than once: the first-run flag and the already
    /// populated product collection keep seed data from being written twice.
    pub async fn init(&self, store: &dyn DurableStore, seed: &dyn SeedProvider) -> StoreResult<()> {
        // Queued writes must land before we read the store back.
        if self.sink.is_running() {
            self.sink.flush().await?;
        }

        info!(store = store.name(), "Initializing ledger cache");

        let mut state = CacheState {
            products: load(store).await?,
            invoices: load(store).await?,
            transactions: load(store).await?,
            customers: load(store).await?,
            proposals: load(store).await?,
            employees: load(store).await?,
            ..CacheState::default()
        };

        let first_run = store.get_meta(META_FIRST_RUN_COMPLETE).await?.is_none();

        if first_run {
            if state.products.is_empty() {
                let data = seed.seed();
                info!(records = data.record_count(), "First run: writing seed data");

                write_seed(store, &data.products).await?;
                write_seed(store, &data.invoices).await?;
                write_seed(store, &data.transactions).await?;
                write_seed(store, &data.customers).await?;

                state.products = data.products;
                if !data.invoices.is_empty() {
                    state.invoices = data.invoices;
                }
                if !data.transactions.is_empty() {
                    state.transactions = data.transactions;
                }
                if !data.customers.is_empty() {
                    state.customers = data.customers;
                }
            } else {
                debug!("Existing data without first-run flag; not seeding");
            }

            store
                .set_meta(META_FIRST_RUN_COMPLETE, Utc::now().to_rfc3339())
                .await?;
        }

        state.settings = load_meta(store, META_APP_SETTINGS).await?.unwrap_or_default();
        state.company = load_meta(store, META_COMPANY_INFO).await?.unwrap_or_default();
        state.last_backup = store
            .get_meta(META_LAST_BACKUP)
            .await?
            .and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring unreadable last backup date");
                    None
                }
            });

        info!(records = state.record_count(), "Ledger cache initialized");

        *self.lock() = state;
        *self
            .inner
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;

        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        *self
            .inner
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of everything in memory.
    pub fn snapshot(&self) -> CacheState {
        self.lock().clone()
    }

    pub fn sink(&self) -> &WriteThrough {
        &self.sink
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Runs `f` with shared access to the state.
    pub fn read<R>(&self, f: impl FnOnce(&CacheState) -> R) -> R {
        f(&self.lock())
    }

    /// Runs a mutation and queues one write-through per touched collection.
    ///
    /// The queueing happens before the lock is released.
    pub fn write<R>(&self, f: impl FnOnce(&mut CacheState, &mut Changes) -> R) -> R {
        let mut state = self.lock();
        let mut changes = Changes::default();

        let result = f(&mut state, &mut changes);

        for collection in changes.collections {
            match state.records(collection) {
                Ok(records) => self.sink.replace_all(collection, records),
                Err(e) => error!(%collection, error = %e, "Could not serialize collection"),
            }
        }
        for (key, value) in changes.meta {
            self.sink.set_meta(key, value);
        }

        result
    }

    /// The cache is the sole writer, so a panic mid-mutation cannot leave a
    /// half-applied write visible to anyone else; the state is still usable.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Repositories
    // =========================================================================

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.clone())
    }

    pub fn proposals(&self) -> ProposalRepository {
        ProposalRepository::new(self.clone())
    }

    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository::new(self.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.clone())
    }
}

// =============================================================================
// Hydration Helpers
// =============================================================================

/// Loads and decodes one collection, skipping records that don't decode.
async fn load<T: Entity>(store: &dyn DurableStore) -> StoreResult<Vec<T>> {
    let collection = T::COLLECTION;
    let raw = store.load_all(collection).await?;
    let total = raw.len();

    let records: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%collection, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect();

    debug!(%collection, loaded = records.len(), skipped = total - records.len(), "Hydrated collection");
    Ok(records)
}

async fn write_seed<T: Entity>(store: &dyn DurableStore, records: &[T]) -> StoreResult<()> {
    if records.is_empty() {
        return Ok(());
    }
    store.replace_all(T::COLLECTION, to_values(records)?).await
}

async fn load_meta<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> StoreResult<Option<T>> {
    let Some(raw) = store.get_meta(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable metadata; using defaults");
            Ok(None)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryStore;
    use crate::repository::CollectionRepository;
    use crate::seed::{DemoSeed, NoSeed};
    use serde_json::json;

    fn cache_over(store: &Arc<MemoryStore>) -> LedgerCache {
        LedgerCache::new(WriteThrough::spawn(store.clone()))
    }

    #[tokio::test]
    async fn test_first_run_seeds_once() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(&store);

        cache.init(store.as_ref(), &DemoSeed).await.unwrap();
        cache.init(store.as_ref(), &DemoSeed).await.unwrap();

        let state = cache.snapshot();
        assert_eq!(state.products.len(), 6);
        assert_eq!(state.invoices.len(), 2);
        assert_eq!(state.transactions.len(), 5);
        assert_eq!(state.customers.len(), 4);
        assert!(cache.is_initialized());
    }

    #[tokio::test]
    async fn test_no_reseed_after_everything_deleted() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(&store);
        cache.init(store.as_ref(), &DemoSeed).await.unwrap();

        for product in cache.products().get_all() {
            cache.products().delete(&product.id);
        }
        cache.init(store.as_ref(), &DemoSeed).await.unwrap();

        assert!(cache.products().get_all().is_empty());
    }

    #[tokio::test]
    async fn test_existing_data_is_adopted_not_seeded() {
        let store = Arc::new(MemoryStore::new());
        let existing = json!({
            "id": "p1", "name": "Cable", "sku": "CBL-1", "quantity": 3,
            "price": 1000, "category": "Misc", "minStock": 1, "taxRate": 0
        });
        store
            .replace_all(Collection::Products, vec![existing, json!({"id": "broken"})])
            .await
            .unwrap();

        let cache = cache_over(&store);
        cache.init(store.as_ref(), &DemoSeed).await.unwrap();

        let products = cache.products().get_all();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "p1");
        assert!(cache.invoices().get_all().is_empty());
    }

    #[tokio::test]
    async fn test_write_enqueues_once_per_touched_collection() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(&store);
        cache.init(store.as_ref(), &NoSeed).await.unwrap();
        let before = store.replace_count();

        cache.write(|_, changes| {
            changes.touch(Collection::Products);
            changes.touch(Collection::Products);
            changes.touch(Collection::Transactions);
        });
        cache.sink().flush().await.unwrap();

        assert_eq!(store.replace_count(), before + 2);
    }

    #[tokio::test]
    async fn test_unreadable_settings_fall_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set_meta(META_APP_SETTINGS, "not json".into()).await.unwrap();

        let cache = cache_over(&store);
        cache.init(store.as_ref(), &NoSeed).await.unwrap();

        assert_eq!(cache.read(|s| s.settings.clone()), AppSettings::default());
    }
}
