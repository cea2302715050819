//! # stockbook-core: Pure Domain Logic for Stockbook
//!
//! Records, money arithmetic, validation and the pure half of the invoice
//! posting protocol. Nothing in this crate touches a database, a file or
//! the clock (except id generation).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  UI / command layer (callers)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ synchronous reads & writes             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           stockbook-store (cache, repositories, backup)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockbook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  posting  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ movements │  │   rules   │  │   │
//! │  │   │  Invoice  │  │  TaxRate  │  │  income   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO FILES • NO NETWORK                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity records (Product, Invoice, Transaction, ...)
//! - [`money`] - Money in integer minor units
//! - [`posting`] - Stock movements and ledger entries produced by invoices
//! - [`reports`] - Dashboard aggregates
//! - [`validation`] - Record validation
//! - [`error`] - Domain error types
//! - [`id`] - Record id generation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::money::Money;
//! use stockbook_core::types::TaxRate;
//!
//! let price = Money::from_minor(1099);
//! let tax = price.calculate_tax(TaxRate::from_bps(825));
//! assert_eq!(tax.minor_units(), 91);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod id;
pub mod money;
pub mod posting;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use id::generate_id;
pub use money::Money;
pub use posting::StatusTransition;
pub use reports::DashboardStats;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines on a single invoice or proposal.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches typos like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9999;
