//! # Settings Repository
//!
//! The two singleton records: [`AppSettings`] and [`CompanyInfo`]. Both live
//! in the cache and are written through to the metadata table as JSON.

use serde::Serialize;
use stockbook_core::{AppSettings, CompanyInfo};
use tracing::{debug, error};

use crate::adapter::{META_APP_SETTINGS, META_COMPANY_INFO};
use crate::cache::{Changes, LedgerCache};

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    cache: LedgerCache,
}

impl SettingsRepository {
    pub fn new(cache: LedgerCache) -> Self {
        SettingsRepository { cache }
    }

    pub fn settings(&self) -> AppSettings {
        self.cache.read(|state| state.settings.clone())
    }

    /// Replaces the application settings.
    pub fn update_settings(&self, settings: AppSettings) -> AppSettings {
        self.cache.write(|state, changes| {
            queue_meta(changes, META_APP_SETTINGS, &settings);
            state.settings = settings;
            state.settings.clone()
        })
    }

    pub fn company(&self) -> CompanyInfo {
        self.cache.read(|state| state.company.clone())
    }

    /// Replaces the company letterhead.
    pub fn update_company(&self, company: CompanyInfo) -> CompanyInfo {
        self.cache.write(|state, changes| {
            queue_meta(changes, META_COMPANY_INFO, &company);
            state.company = company;
            state.company.clone()
        })
    }
}

pub(crate) fn queue_meta<T: Serialize>(changes: &mut Changes, key: &'static str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            debug!(key, "Singleton updated");
            changes.set_meta(key, json);
        }
        Err(e) => error!(key, error = %e, "Could not serialize singleton; kept in memory only"),
    }
}
