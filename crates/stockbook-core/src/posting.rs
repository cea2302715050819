//! # Invoice Posting
//!
//! The pure half of the invoice posting protocol: which stock movements and
//! which ledger entry an invoice produces when it becomes paid, and what is
//! undone when it stops being paid. The store applies these effects to its
//! in-memory collections as one unit.
//!
//! ## Status Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Invoice Status Transitions                           │
//! │                                                                         │
//! │  (new) ──paid──► POST                                                  │
//! │     • every line: product.quantity -= item.quantity (no floor)         │
//! │     • one income Transaction (amount = invoice total)                  │
//! │                                                                         │
//! │  pending/overdue ──► paid      POST   (same effects)                   │
//! │  paid ──► pending/overdue      UNPOST                                   │
//! │     • every line: product.quantity += item.quantity                    │
//! │     • the income Transaction is NOT reversed                           │
//! │                                                                         │
//! │  anything else                 no effect                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus, Product, Transaction, TransactionKind};

/// What a status change means for stock and ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// The invoice became paid: decrement stock and record income.
    Post,
    /// The invoice stopped being paid: restore stock.
    Unpost,
    /// No stock or ledger effect.
    Unchanged,
}

impl StatusTransition {
    /// Classifies a status change. `previous` is `None` for a new invoice.
    pub fn between(previous: Option<InvoiceStatus>, next: InvoiceStatus) -> Self {
        let was_paid = previous.map(|s| s.is_paid()).unwrap_or(false);

        match (was_paid, next.is_paid()) {
            (false, true) => StatusTransition::Post,
            (true, false) => StatusTransition::Unpost,
            _ => StatusTransition::Unchanged,
        }
    }
}

/// A signed change to one product's on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: String,
    pub delta: i64,
}

/// Movements that posting `invoice` produces (one per line, negative).
pub fn sale_movements(invoice: &Invoice) -> Vec<StockMovement> {
    invoice
        .items
        .iter()
        .map(|item| StockMovement {
            product_id: item.product_id.clone(),
            delta: -item.quantity,
        })
        .collect()
}

/// Movements that undo a previous posting of `invoice`.
pub fn restore_movements(invoice: &Invoice) -> Vec<StockMovement> {
    sale_movements(invoice)
        .into_iter()
        .map(|m| StockMovement {
            delta: -m.delta,
            ..m
        })
        .collect()
}

/// Applies movements to a product list in place.
///
/// Quantities are never clamped: selling 15 of a product with 10 on hand
/// leaves it at -5. Movements naming a product that does not exist are
/// skipped.
///
/// ## Returns
/// The number of movements that matched a product.
pub fn apply_movements(products: &mut [Product], movements: &[StockMovement]) -> usize {
    let mut applied = 0;

    for movement in movements {
        if let Some(product) = products.iter_mut().find(|p| p.id == movement.product_id) {
            product.quantity += movement.delta;
            applied += 1;
        }
    }

    applied
}

/// Description written on the income entry derived from an invoice.
pub fn income_description(invoice: &Invoice) -> String {
    format!("Invoice payment - {}", invoice.customer_name)
}

/// Builds the income ledger entry a posted invoice produces.
///
/// Amount, date and payment details are copied from the invoice; the
/// entry keeps a back-reference to the invoice id.
pub fn derived_income(invoice: &Invoice, id: String) -> Transaction {
    Transaction {
        id,
        description: income_description(invoice),
        amount: invoice.amount,
        kind: TransactionKind::Income,
        date: invoice.date,
        payment_method: invoice.payment_method,
        maturity_date: invoice.maturity_date,
        invoice_id: Some(invoice.id.clone()),
    }
}

/// Builds the expense entry for one salary payment.
pub fn salary_expense(
    full_name: &str,
    salary: Money,
    date: chrono::NaiveDate,
    id: String,
) -> Transaction {
    Transaction {
        id,
        description: format!("Salary payment - {}", full_name),
        amount: salary,
        kind: TransactionKind::Expense,
        date,
        payment_method: None,
        maturity_date: None,
        invoice_id: None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceItem, PaymentMethod, TaxRate};
    use chrono::NaiveDate;

    fn product(id: &str, quantity: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            sku: format!("SKU-{}", id),
            quantity,
            price: Money::from_major(10),
            category: "General".to_string(),
            min_stock: 1,
            tax_rate: TaxRate::zero(),
            image: None,
        }
    }

    fn invoice(lines: &[(&str, i64)], status: InvoiceStatus) -> Invoice {
        let items = lines
            .iter()
            .map(|(id, qty)| InvoiceItem::new(*id, "", *qty, Money::from_major(10), TaxRate::zero()))
            .collect();
        let mut invoice = Invoice::new(
            "ABC Ltd",
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            status,
            items,
        );
        invoice.id = "inv-1".to_string();
        invoice
    }

    #[test]
    fn test_transition_classification() {
        use InvoiceStatus::*;
        assert_eq!(StatusTransition::between(None, Paid), StatusTransition::Post);
        assert_eq!(StatusTransition::between(None, Pending), StatusTransition::Unchanged);
        assert_eq!(StatusTransition::between(Some(Pending), Paid), StatusTransition::Post);
        assert_eq!(StatusTransition::between(Some(Paid), Overdue), StatusTransition::Unpost);
        assert_eq!(StatusTransition::between(Some(Paid), Paid), StatusTransition::Unchanged);
        assert_eq!(StatusTransition::between(Some(Overdue), Pending), StatusTransition::Unchanged);
    }

    #[test]
    fn test_sale_movements_decrement_without_floor() {
        let mut products = vec![product("1", 10), product("2", 4)];
        let inv = invoice(&[("1", 15), ("2", 1)], InvoiceStatus::Paid);

        let applied = apply_movements(&mut products, &sale_movements(&inv));

        assert_eq!(applied, 2);
        assert_eq!(products[0].quantity, -5);
        assert_eq!(products[1].quantity, 3);
    }

    #[test]
    fn test_restore_undoes_sale() {
        let mut products = vec![product("1", 10)];
        let inv = invoice(&[("1", 3)], InvoiceStatus::Paid);

        apply_movements(&mut products, &sale_movements(&inv));
        apply_movements(&mut products, &restore_movements(&inv));

        assert_eq!(products[0].quantity, 10);
    }

    #[test]
    fn test_unknown_products_are_skipped() {
        let mut products = vec![product("1", 10)];
        let inv = invoice(&[("missing", 3)], InvoiceStatus::Paid);

        assert_eq!(apply_movements(&mut products, &sale_movements(&inv)), 0);
        assert_eq!(products[0].quantity, 10);
    }

    #[test]
    fn test_derived_income_copies_invoice() {
        let inv = invoice(&[("1", 2)], InvoiceStatus::Paid)
            .with_payment(PaymentMethod::Transfer, None);

        let tx = derived_income(&inv, "tx-1".to_string());

        assert_eq!(tx.kind, TransactionKind::Income);
        assert_eq!(tx.amount, inv.amount);
        assert_eq!(tx.date, inv.date);
        assert_eq!(tx.payment_method, Some(PaymentMethod::Transfer));
        assert_eq!(tx.invoice_id.as_deref(), Some("inv-1"));
        assert!(tx.description.contains("ABC Ltd"));
    }
}
