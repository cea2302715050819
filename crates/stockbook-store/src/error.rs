//! # Store Error Types
//!
//! Error types for persistence, backup and configuration.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / io::Error / serde_json::Error / toml errors             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ├──► init / backup / config callers (returned)                    │
//! │       │                                                                 │
//! │       └──► write-through worker (logged + counted, never returned      │
//! │            to the repository call that caused the write)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockbook_core::{Collection, CoreError};
use thiserror::Error;

/// Persistence, backup and configuration errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record handed to `replace_all` has no string `id` field.
    ///
    /// ## When This Occurs
    /// - A payload was built by hand without an id
    /// - A backup document was edited and lost its ids
    #[error("Record at position {position} in {collection} has no id")]
    MissingId {
        collection: Collection,
        position: usize,
    },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two records in one collection share an id
    #[error("Duplicate key: {0}")]
    UniqueViolation(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created (permissions, missing parent)
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// The durable store refused the operation.
    ///
    /// ## When This Occurs
    /// - In-memory store with failure injection switched on
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The write-through worker has stopped.
    #[error("Write-through worker is not running")]
    SinkClosed,

    /// A backup document could not be understood.
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → UNIQUE constraint → UniqueViolation
///                               otherwise         → QueryFailed
/// sqlx::Error::PoolTimedOut   → PoolExhausted
/// sqlx::Error::PoolClosed     → ConnectionFailed
/// Other                       → Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if let Some(field) = msg.split("UNIQUE constraint failed: ").nth(1) {
                    StoreError::UniqueViolation(field.to_string())
                } else {
                    StoreError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,

            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),

            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_message_names_collection() {
        let err = StoreError::MissingId {
            collection: Collection::Invoices,
            position: 3,
        };
        assert_eq!(err.to_string(), "Record at position 3 in invoices has no id");
    }

    #[test]
    fn test_pool_errors_are_categorized() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::PoolExhausted
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::ConnectionFailed(_)
        ));
    }
}
