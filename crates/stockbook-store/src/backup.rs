//! # Backup and Restore
//!
//! Full-snapshot export of the ledger to a single JSON document, and the
//! advisory "time for a backup" reminder.
//!
//! ## Document
//! ```text
//! <AppName>_Full_Data_<YYYY-MM-DD>.json
//! {
//!   "products":     [...],
//!   "invoices":     [...],
//!   "transactions": [...],
//!   "customers":    [...],
//!   "proposals":    [...],
//!   "employees":    [...],
//!   "settings":     {...},
//!   "company":      {...},
//!   "backupDate":   "2026-05-01T09:30:00+00:00"
//! }
//! ```
//!
//! ## Encoding
//! Records are stored exactly as the cache holds them:
//!
//! - Money is integer minor units: `"price": 2500000` is 25000.00
//! - Tax rates are basis points: `"taxRate": 2000` is 20%
//! - Dates are ISO 8601; `backupDate` carries a UTC offset
//!
//! ## Restore
//! The whole document is parsed and every product, customer, employee,
//! invoice and proposal is validated before the cache changes. One bad
//! record rejects the file.
//!
//! ## Staleness
//! `needs_backup` is true when no backup was ever taken or the last one is
//! older than the configured interval. It never blocks any operation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stockbook_core::validation::{
    validate_customer, validate_employee, validate_invoice, validate_product, validate_proposal,
};
use stockbook_core::{
    AppSettings, Collection, CompanyInfo, Customer, Employee, Invoice, Product, Proposal,
    Transaction,
};
use tracing::{debug, info};

use crate::adapter::{META_APP_SETTINGS, META_COMPANY_INFO, META_LAST_BACKUP};
use crate::cache::{CacheState, LedgerCache};
use crate::error::{StoreError, StoreResult};
use crate::repository::settings::queue_meta;

/// Hours between backups before a reminder is due.
pub const DEFAULT_BACKUP_INTERVAL_HOURS: i64 = 24;

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub products: Vec<Product>,
    pub invoices: Vec<Invoice>,
    pub transactions: Vec<Transaction>,
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default)]
    pub company: CompanyInfo,
    pub backup_date: DateTime<Utc>,
}

impl BackupDocument {
    fn from_state(state: CacheState, backup_date: DateTime<Utc>) -> Self {
        BackupDocument {
            products: state.products,
            invoices: state.invoices,
            transactions: state.transactions,
            customers: state.customers,
            proposals: state.proposals,
            employees: state.employees,
            settings: state.settings,
            company: state.company,
            backup_date,
        }
    }

    pub fn record_count(&self) -> usize {
        self.products.len()
            + self.invoices.len()
            + self.transactions.len()
            + self.customers.len()
            + self.proposals.len()
            + self.employees.len()
    }

    /// Checks every record against the same rules the forms use.
    ///
    /// ## Returns
    /// The first failure, naming the collection and record id.
    pub fn validate(&self) -> Result<(), String> {
        fn check<T, E: std::fmt::Display>(
            kind: &str,
            records: &[T],
            id: impl Fn(&T) -> &str,
            rule: impl Fn(&T) -> Result<(), E>,
        ) -> Result<(), String> {
            for record in records {
                rule(record).map_err(|e| format!("{} {}: {}", kind, id(record), e))?;
            }
            Ok(())
        }

        check("product", &self.products, |r| r.id.as_str(), validate_product)?;
        check("customer", &self.customers, |r| r.id.as_str(), validate_customer)?;
        check("employee", &self.employees, |r| r.id.as_str(), validate_employee)?;
        check("invoice", &self.invoices, |r| r.id.as_str(), validate_invoice)?;
        check("proposal", &self.proposals, |r| r.id.as_str(), validate_proposal)
    }
}

/// What a successful backup produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupReceipt {
    pub path: PathBuf,
    pub backup_date: DateTime<Utc>,
    pub record_count: usize,
}

// =============================================================================
// Backup Manager
// =============================================================================

#[derive(Debug, Clone)]
pub struct BackupManager {
    cache: LedgerCache,
    app_name: String,
    interval: Duration,
}

impl BackupManager {
    pub fn new(cache: LedgerCache, app_name: impl Into<String>, interval_hours: i64) -> Self {
        BackupManager {
            cache,
            app_name: app_name.into(),
            interval: Duration::hours(interval_hours),
        }
    }

    /// File name for a backup taken at `at`.
    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        format!("{}_Full_Data_{}.json", self.app_name, at.format("%Y-%m-%d"))
    }

    /// Writes a backup of everything in the cache into `dir`.
    pub fn create_backup(&self, dir: &Path) -> StoreResult<BackupReceipt> {
        self.create_backup_at(dir, Utc::now())
    }

    /// Like [`create_backup`](Self::create_backup) with an explicit timestamp.
    ///
    /// A second backup on the same day overwrites the first.
    pub fn create_backup_at(&self, dir: &Path, at: DateTime<Utc>) -> StoreResult<BackupReceipt> {
        let document = BackupDocument::from_state(self.cache.snapshot(), at);
        let record_count = document.record_count();

        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name(at));
        fs::write(&path, serde_json::to_vec_pretty(&document)?)?;

        self.cache.write(|state, changes| {
            state.last_backup = Some(at);
            changes.set_meta(META_LAST_BACKUP, at.to_rfc3339());
        });

        info!(path = %path.display(), records = record_count, "Backup created");

        Ok(BackupReceipt {
            path,
            backup_date: at,
            record_count,
        })
    }

    pub fn last_backup_date(&self) -> Option<DateTime<Utc>> {
        self.cache.read(|state| state.last_backup)
    }

    /// True when no backup exists or the last one is older than the interval.
    pub fn needs_backup(&self, now: DateTime<Utc>) -> bool {
        match self.last_backup_date() {
            None => true,
            Some(last) => now - last > self.interval,
        }
    }

    /// Replaces every collection and both singletons with a backup's contents.
    ///
    /// The backup is parsed and validated completely before anything in the
    /// cache changes.
    ///
    /// ## Returns
    /// Number of records restored.
    pub fn restore_backup(&self, path: &Path) -> StoreResult<usize> {
        let bytes = fs::read(path)?;
        let document: BackupDocument = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::InvalidBackup(format!("{}: {}", path.display(), e)))?;
        document
            .validate()
            .map_err(|reason| StoreError::InvalidBackup(format!("{}: {}", path.display(), reason)))?;
        let record_count = document.record_count();

        debug!(path = %path.display(), taken = %document.backup_date, "Restoring backup");

        self.cache.write(|state, changes| {
            queue_meta(changes, META_APP_SETTINGS, &document.settings);
            queue_meta(changes, META_COMPANY_INFO, &document.company);

            state.products = document.products;
            state.invoices = document.invoices;
            state.transactions = document.transactions;
            state.customers = document.customers;
            state.proposals = document.proposals;
            state.employees = document.employees;
            state.settings = document.settings;
            state.company = document.company;

            for collection in Collection::ALL {
                changes.touch(collection);
            }
        });

        info!(path = %path.display(), records = record_count, "Backup restored");
        Ok(record_count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
