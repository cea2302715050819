//! # Reports
//!
//! Read-only aggregates computed over snapshots of the collections. Nothing
//! here is persisted; the dashboard recomputes on every read.

use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, Invoice, InvoiceStatus, Product, Transaction, TransactionKind};

/// Headline figures for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_income: Money,
    pub total_expense: Money,
    /// `total_income - total_expense`.
    pub net: Money,
    /// Sum of invoice amounts that are not yet paid.
    pub pending_receivables: Money,
    pub overdue_count: usize,
    pub low_stock_count: usize,
    /// On-hand stock valued at unit price.
    pub stock_value: Money,
}

impl DashboardStats {
    pub fn compute(
        products: &[Product],
        invoices: &[Invoice],
        transactions: &[Transaction],
    ) -> Self {
        let total_income = sum_kind(transactions, TransactionKind::Income);
        let total_expense = sum_kind(transactions, TransactionKind::Expense);

        DashboardStats {
            total_income,
            total_expense,
            net: total_income - total_expense,
            pending_receivables: invoices
                .iter()
                .filter(|i| !i.status.is_paid())
                .map(|i| i.amount)
                .sum(),
            overdue_count: invoices
                .iter()
                .filter(|i| i.status == InvoiceStatus::Overdue)
                .count(),
            low_stock_count: low_stock(products).count(),
            stock_value: products.iter().map(Product::stock_value).sum(),
        }
    }
}

/// Sums transaction amounts of one kind.
pub fn sum_kind(transactions: &[Transaction], kind: TransactionKind) -> Money {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}

/// Products at or below their minimum-stock threshold.
pub fn low_stock(products: &[Product]) -> impl Iterator<Item = &Product> {
    products.iter().filter(|p| p.is_low_stock())
}

/// Whether `invoice` belongs to `customer`.
///
/// Invoices carrying a `customer_id` match on id only. Older invoices
/// without one fall back to an exact name comparison, so two customers
/// sharing a name share those invoices.
pub fn invoice_belongs_to(invoice: &Invoice, customer: &Customer) -> bool {
    match &invoice.customer_id {
        Some(id) => *id == customer.id,
        None => invoice.customer_name == customer.name,
    }
}

/// Outstanding (unpaid) invoice total for one customer.
pub fn customer_balance(customer: &Customer, invoices: &[Invoice]) -> Money {
    invoices
        .iter()
        .filter(|i| !i.status.is_paid() && invoice_belongs_to(i, customer))
        .map(|i| i.amount)
        .sum()
}

/// Invoices still pending whose date is before `today`.
///
/// Callers decide whether to flip these to overdue; nothing here mutates.
pub fn pending_older_than<'a>(
    invoices: &'a [Invoice],
    today: NaiveDate,
) -> impl Iterator<Item = &'a Invoice> {
    invoices
        .iter()
        .filter(move |i| i.status == InvoiceStatus::Pending && i.date < today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceItem, PartyRole, TaxRate};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn invoice(name: &str, major: i64, status: InvoiceStatus) -> Invoice {
        let items = vec![InvoiceItem::new("1", "", 1, Money::from_major(major), TaxRate::zero())];
        Invoice::new(name, date(1), status, items)
    }

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            role: PartyRole::Customer,
            email: None,
            phone: None,
            address: None,
            tax_number: None,
            tax_office: None,
        }
    }

    #[test]
    fn test_dashboard_totals() {
        let transactions = vec![
            Transaction::new("a", Money::from_major(100), TransactionKind::Income, date(1)),
            Transaction::new("b", Money::from_major(30), TransactionKind::Expense, date(2)),
        ];
        let invoices = vec![
            invoice("X", 50, InvoiceStatus::Pending),
            invoice("Y", 20, InvoiceStatus::Overdue),
            invoice("Z", 99, InvoiceStatus::Paid),
        ];

        let stats = DashboardStats::compute(&[], &invoices, &transactions);

        assert_eq!(stats.net, Money::from_major(70));
        assert_eq!(stats.pending_receivables, Money::from_major(70));
        assert_eq!(stats.overdue_count, 1);
    }

    #[test]
    fn test_customer_balance_prefers_id() {
        let alice = customer("c1", "Alice");
        let other_alice = customer("c2", "Alice");

        let invoices = vec![
            invoice("Alice", 10, InvoiceStatus::Pending).with_customer_id("c1"),
            invoice("Alice", 5, InvoiceStatus::Pending).with_customer_id("c2"),
            invoice("Alice", 7, InvoiceStatus::Pending),
        ];

        assert_eq!(customer_balance(&alice, &invoices), Money::from_major(17));
        assert_eq!(customer_balance(&other_alice, &invoices), Money::from_major(12));
    }

    #[test]
    fn test_pending_older_than() {
        let invoices = vec![invoice("A", 1, InvoiceStatus::Pending)];
        assert_eq!(pending_older_than(&invoices, date(2)).count(), 1);
        assert_eq!(pending_older_than(&invoices, date(1)).count(), 0);
    }
}
