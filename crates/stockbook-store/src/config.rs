//! # Ledger Configuration
//!
//! Where the ledger lives on disk and how it behaves on first run.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKBOOK_DB_PATH=/srv/stockbook/ledger.db                         │
//! │     STOCKBOOK_SEED=false                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockbook/stockbook.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockbook.stockbook/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     platform data dir, seeding on, 24h backup reminder                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! app_name = "Stockbook"
//! database_path = "/home/ayse/.local/share/stockbook/stockbook.db"
//! backup_dir = "/home/ayse/Documents/stockbook-backups"
//! seed_on_first_run = true
//! backup_interval_hours = 24
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

const ENV_APP_NAME: &str = "STOCKBOOK_APP_NAME";
const ENV_DB_PATH: &str = "STOCKBOOK_DB_PATH";
const ENV_BACKUP_DIR: &str = "STOCKBOOK_BACKUP_DIR";
const ENV_SEED: &str = "STOCKBOOK_SEED";
const ENV_BACKUP_INTERVAL: &str = "STOCKBOOK_BACKUP_INTERVAL_HOURS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Used in backup file names.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory backups are written into.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Populate demo data on the very first run.
    #[serde(default = "default_true")]
    pub seed_on_first_run: bool,

    /// Hours after which a backup reminder is due.
    #[serde(default = "default_backup_interval")]
    pub backup_interval_hours: u32,
}

fn default_app_name() -> String {
    "Stockbook".to_string()
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "stockbook", "stockbook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("stockbook-data"))
}

fn default_database_path() -> PathBuf {
    data_dir().join("stockbook.db")
}

fn default_backup_dir() -> PathBuf {
    data_dir().join("backups")
}

fn default_true() -> bool {
    true
}

fn default_backup_interval() -> u32 {
    24
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            app_name: default_app_name(),
            database_path: default_database_path(),
            backup_dir: default_backup_dir(),
            seed_on_first_run: true,
            backup_interval_hours: default_backup_interval(),
        }
    }
}

impl LedgerConfig {
    /// Defaults with the database and backups under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        LedgerConfig {
            database_path: dir.join("stockbook.db"),
            backup_dir: dir.join("backups"),
            ..Self::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockbook.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Ledger config saved");
        Ok(())
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.app_name.trim().is_empty() {
            return Err(StoreError::InvalidConfig("app_name must not be empty".into()));
        }

        if self.backup_interval_hours == 0 {
            return Err(StoreError::InvalidConfig(
                "backup_interval_hours must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `STOCKBOOK_*` overrides read through `lookup`.
    ///
    /// Unparseable numeric or boolean values are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup(ENV_APP_NAME) {
            self.app_name = name;
        }

        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup(ENV_BACKUP_DIR) {
            self.backup_dir = PathBuf::from(dir);
        }

        if let Some(seed) = lookup(ENV_SEED) {
            match seed.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.seed_on_first_run = true,
                "false" | "0" | "no" => self.seed_on_first_run = false,
                _ => warn!(value = %seed, "Unknown {} value in environment", ENV_SEED),
            }
        }

        if let Some(hours) = lookup(ENV_BACKUP_INTERVAL) {
            match hours.parse::<u32>() {
                Ok(h) => self.backup_interval_hours = h,
                Err(_) => warn!(value = %hours, "Ignoring invalid {}", ENV_BACKUP_INTERVAL),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockbook", "stockbook")
            .map(|dirs| dirs.config_dir().join("stockbook.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.app_name, "Stockbook");
        assert!(config.seed_on_first_run);
        assert_eq!(config.backup_interval_hours, 24);
        assert!(config.database_path.ends_with("stockbook.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LedgerConfig::default();

        config.app_name = "  ".to_string();
        assert!(config.validate().is_err());

        config.app_name = "Defter".to_string();
        config.backup_interval_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("STOCKBOOK_DB_PATH", "/tmp/ledger.db"),
            ("STOCKBOOK_SEED", "false"),
            ("STOCKBOOK_BACKUP_INTERVAL_HOURS", "not-a-number"),
        ]);
        let mut config = LedgerConfig::default();

        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/tmp/ledger.db"));
        assert!(!config.seed_on_first_run);
        assert_eq!(config.backup_interval_hours, 24);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stockbook.toml");

        let mut config = LedgerConfig::in_dir(dir.path());
        config.app_name = "Defter".to_string();
        config.backup_interval_hours = 48;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: LedgerConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: LedgerConfig = toml::from_str("app_name = \"Defter\"").unwrap();
        assert_eq!(loaded.app_name, "Defter");
        assert!(loaded.seed_on_first_run);
        assert_eq!(loaded.backup_interval_hours, 24);
    }
}
