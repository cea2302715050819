//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbook-store errors (separate crate)                               │
//! │  └── StoreError       - Durable store / backup / config failures       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation runs before a record ever reaches the cache; the cache and
//! repositories assume they are handed valid records.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    /// An invoice or proposal total disagrees with its line items.
    #[error("Amount {actual} does not match line item total {expected}")]
    AmountMismatch { expected: Money, actual: Money },

    /// A collection name that is not one of the known collections.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors raised before records reach the cache.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// A dependent field is missing (e.g. maturity date for a check).
    #[error("{field} is required when {reason}")]
    RequiredWhen { field: String, reason: String },

    #[error("{field} has invalid value: {reason}")]
    Invalid { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::AmountMismatch {
            expected: Money::from_minor(2500),
            actual: Money::from_minor(2400),
        };
        assert_eq!(
            err.to_string(),
            "Amount 24.00 does not match line item total 25.00"
        );

        let err = ValidationError::RequiredWhen {
            field: "maturityDate".to_string(),
            reason: "paying by check".to_string(),
        };
        assert_eq!(err.to_string(), "maturityDate is required when paying by check");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
