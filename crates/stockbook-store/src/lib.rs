//! # stockbook-store: Cache and Persistence Layer for Stockbook
//!
//! Owns the in-memory ledger and everything that keeps it durable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  Caller (UI, operator binary)                                          │
//! │       │  ledger.invoices().add(invoice)       synchronous              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockbook-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ Repositories  │───►│  LedgerCache  │───►│ WriteThrough │  │   │
//! │  │   │ (repository/) │    │  (cache.rs)   │    │  (sink.rs)   │  │   │
//! │  │   │ posting,      │    │ Mutex<State>  │    │ mpsc + task  │  │   │
//! │  │   │ conversion    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │                                                    │          │   │
//! │  │   ┌───────────────┐    ┌───────────────────────────▼───────┐  │   │
//! │  │   │ BackupManager │    │ dyn DurableStore (adapter/)       │  │   │
//! │  │   │ (backup.rs)   │    │ SqliteStore | MemoryStore         │  │   │
//! │  │   └───────────────┘    └───────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/stockbook/stockbook.db                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`adapter`] - Durable store trait, SQLite and in-memory backends
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`sink`] - Background write-through queue
//! - [`seed`] - First-run demo data
//! - [`cache`] - The synchronous in-memory ledger
//! - [`repository`] - Per-collection operations, invoice posting
//! - [`backup`] - JSON export/restore and the backup reminder
//! - [`config`] - File and environment configuration
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_store::{Ledger, LedgerConfig};
//! use stockbook_store::repository::CollectionRepository;
//!
//! let ledger = Ledger::open(LedgerConfig::load_or_default(None)).await?;
//!
//! let products = ledger.products().get_all();
//! ledger.invoices().add(invoice);
//!
//! ledger.shutdown().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapter;
pub mod backup;
pub mod cache;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod sink;

// =============================================================================
// Re-exports
// =============================================================================

pub use adapter::{DurableStore, MemoryStore, SqliteStore};
pub use backup::{BackupDocument, BackupManager, BackupReceipt};
pub use cache::{CacheState, LedgerCache};
pub use config::LedgerConfig;
pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use repository::CollectionRepository;
pub use seed::{DemoSeed, NoSeed, SeedData, SeedProvider};
pub use sink::{SinkStats, WriteThrough};

use std::sync::Arc;
use stockbook_core::DashboardStats;
use tracing::info;

use repository::{
    CustomerRepository, EmployeeRepository, InvoiceRepository, ProductRepository,
    ProposalRepository, SettingsRepository, TransactionRepository,
};

// =============================================================================
// Ledger
// =============================================================================

/// The composed ledger: one durable store, one write-through worker, one
/// cache. Construct once at startup and hand out repositories from it.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Ledger::open                                      │
/// │                                                                         │
/// │  1. Create the database directory                                      │
/// │  2. Connect SQLite (WAL), run migrations                               │
/// │  3. Spawn the write-through worker on the current runtime              │
/// │  4. Build the cache and init() it (seed on first run)                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub struct Ledger {
    cache: LedgerCache,
    store: Arc<dyn DurableStore>,
    database: Option<Database>,
    config: LedgerConfig,
}

impl Ledger {
    /// Opens the SQLite-backed ledger described by `config`.
    pub async fn open(config: LedgerConfig) -> StoreResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let database = Database::new(DbConfig::new(&config.database_path)).await?;
        let store: Arc<dyn DurableStore> = Arc::new(database.store());
        let seed = seed_provider_for(&config);

        let mut ledger = Self::with_store(store, seed.as_ref(), config).await?;
        ledger.database = Some(database);
        Ok(ledger)
    }

    /// Composes a ledger over any durable store.
    pub async fn with_store(
        store: Arc<dyn DurableStore>,
        seed: &dyn SeedProvider,
        config: LedgerConfig,
    ) -> StoreResult<Self> {
        let cache = LedgerCache::new(WriteThrough::spawn(Arc::clone(&store)));
        cache.init(store.as_ref(), seed).await?;

        info!(store = store.name(), app = %config.app_name, "Ledger ready");

        Ok(Ledger {
            cache,
            store,
            database: None,
            config,
        })
    }

    pub fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn products(&self) -> ProductRepository {
        self.cache.products()
    }

    pub fn customers(&self) -> CustomerRepository {
        self.cache.customers()
    }

    pub fn invoices(&self) -> InvoiceRepository {
        self.cache.invoices()
    }

    pub fn transactions(&self) -> TransactionRepository {
        self.cache.transactions()
    }

    pub fn proposals(&self) -> ProposalRepository {
        self.cache.proposals()
    }

    pub fn employees(&self) -> EmployeeRepository {
        self.cache.employees()
    }

    pub fn settings(&self) -> SettingsRepository {
        self.cache.settings()
    }

    pub fn backups(&self) -> BackupManager {
        BackupManager::new(
            self.cache.clone(),
            self.config.app_name.clone(),
            i64::from(self.config.backup_interval_hours),
        )
    }

    pub fn dashboard(&self) -> DashboardStats {
        self.cache.read(|state| {
            DashboardStats::compute(&state.products, &state.invoices, &state.transactions)
        })
    }

    /// When first-run seeding was settled, if it has been.
    pub async fn first_run_completed(&self) -> StoreResult<Option<String>> {
        self.store.get_meta(adapter::META_FIRST_RUN_COMPLETE).await
    }

    /// Whether the SQLite pool answers a query. `None` for stores without a
    /// database.
    pub async fn health_check(&self) -> Option<bool> {
        match &self.database {
            Some(database) => Some(database.health_check().await),
            None => None,
        }
    }

    pub fn sink_stats(&self) -> SinkStats {
        self.cache.sink().stats()
    }

    /// Waits for every queued write-through to be attempted.
    pub async fn flush(&self) -> StoreResult<()> {
        self.cache.sink().flush().await
    }

    /// Drains the write-through queue, stops the worker and closes the pool.
    pub async fn shutdown(self) -> StoreResult<()> {
        self.cache.sink().shutdown().await?;
        if let Some(database) = &self.database {
            database.close().await;
        }

        let stats = self.cache.sink().stats();
        info!(applied = stats.applied, failed = stats.failed, "Ledger shut down");
        Ok(())
    }
}

/// Seed provider selected by `seed_on_first_run`.
pub fn seed_provider_for(config: &LedgerConfig) -> Box<dyn SeedProvider> {
    if config.seed_on_first_run {
        Box::new(DemoSeed)
    } else {
        Box::new(NoSeed)
    }
}
