//! # Validation Module
//!
//! Record validation that runs before anything reaches the cache.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (frontend)                                              │
//! │  └── Empty fields, obvious typos                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Whole-record rules (maturity dates, line totals, ranges)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Cache / Repositories                                                  │
//! │  └── Trust their input; never reject a record                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("LAP-001").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, Employee, Invoice, InvoiceItem, Product, Proposal, TaxRate};
use crate::{MAX_ITEM_QUANTITY, MAX_LINE_ITEMS};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required display name (product, customer, employee).
///
/// Must be non-blank and at most 200 characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a stock-keeping code.
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::Invalid {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity: positive and at most [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount. Zero is allowed.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate: 0% to 100%.
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a product form.
///
/// Quantity may be zero or even negative on edit (it reflects past
/// postings); only the descriptive fields and prices are checked.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_sku(&product.sku)?;
    validate_amount("price", product.price)?;
    validate_tax_rate(product.tax_rate)?;

    if product.min_stock < 0 {
        return Err(ValidationError::Negative {
            field: "minStock".to_string(),
        });
    }

    Ok(())
}

pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_name("name", &customer.name)
}

pub fn validate_employee(employee: &Employee) -> ValidationResult<()> {
    validate_name("fullName", &employee.full_name)?;
    validate_name("position", &employee.position)?;
    validate_amount("salary", employee.salary)
}

fn validate_items(items: &[InvoiceItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(ValidationError::required("items").into());
    }

    if items.len() > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        }
        .into());
    }

    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::required("productId").into());
        }
        validate_quantity(item.quantity)?;
        validate_amount("unitPrice", item.unit_price)?;
        validate_tax_rate(item.tax_rate)?;

        let expected = item.computed_total();
        if item.total != expected {
            return Err(CoreError::AmountMismatch {
                expected,
                actual: item.total,
            });
        }
    }

    Ok(())
}

/// Validates an invoice before it is handed to the invoice repository.
///
/// ## Rules
/// - Customer name is required
/// - At least one line; every line has a product, a valid quantity and a
///   total matching `unit_price × quantity × (1 + tax)`
/// - `amount` equals the sum of line totals
/// - Checks and promissory notes carry a maturity date
pub fn validate_invoice(invoice: &Invoice) -> CoreResult<()> {
    validate_name("customerName", &invoice.customer_name)?;
    validate_items(&invoice.items)?;

    let expected = invoice.items_total();
    if invoice.amount != expected {
        return Err(CoreError::AmountMismatch {
            expected,
            actual: invoice.amount,
        });
    }

    if let Some(method) = invoice.payment_method {
        if method.requires_maturity() && invoice.maturity_date.is_none() {
            return Err(ValidationError::RequiredWhen {
                field: "maturityDate".to_string(),
                reason: "paying by check or promissory note".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

/// Validates a proposal. Same line rules as invoices; the validity date
/// must not precede the issue date.
pub fn validate_proposal(proposal: &Proposal) -> CoreResult<()> {
    validate_name("customerName", &proposal.customer_name)?;
    validate_items(&proposal.items)?;

    let expected = crate::types::items_total(&proposal.items);
    if proposal.amount != expected {
        return Err(CoreError::AmountMismatch {
            expected,
            actual: proposal.amount,
        });
    }

    if proposal.valid_until < proposal.date {
        return Err(ValidationError::Invalid {
            field: "validUntil".to_string(),
            reason: "must not be earlier than the proposal date".to_string(),
        }
        .into());
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceStatus, PaymentMethod};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn item(qty: i64) -> InvoiceItem {
        InvoiceItem::new("1", "Laptop", qty, Money::from_major(100), TaxRate::from_bps(1800))
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("LAP-001").is_ok());
        assert!(validate_sku("product_1").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_valid_invoice_passes() {
        let invoice = Invoice::new("ABC", date(1), InvoiceStatus::Paid, vec![item(2)]);
        assert!(validate_invoice(&invoice).is_ok());
    }

    #[test]
    fn test_invoice_amount_must_match_items() {
        let mut invoice = Invoice::new("ABC", date(1), InvoiceStatus::Paid, vec![item(2)]);
        invoice.amount = Money::from_major(1);
        assert!(matches!(
            validate_invoice(&invoice),
            Err(CoreError::AmountMismatch { .. })
        ));
    }

    #[test]
    fn test_check_payment_requires_maturity() {
        let invoice = Invoice::new("ABC", date(1), InvoiceStatus::Pending, vec![item(1)])
            .with_payment(PaymentMethod::Check, None);
        assert!(validate_invoice(&invoice).is_err());

        let invoice = invoice.with_payment(PaymentMethod::Check, Some(date(30)));
        assert!(validate_invoice(&invoice).is_ok());
    }

    #[test]
    fn test_invoice_without_items_is_rejected() {
        let invoice = Invoice::new("ABC", date(1), InvoiceStatus::Pending, vec![]);
        assert!(validate_invoice(&invoice).is_err());
    }

    #[test]
    fn test_proposal_validity_window() {
        let proposal = Proposal::new("ABC", date(10), date(5), vec![item(1)]);
        assert!(validate_proposal(&proposal).is_err());

        let proposal = Proposal::new("ABC", date(10), date(20), vec![item(1)]);
        assert!(validate_proposal(&proposal).is_ok());
    }
}
