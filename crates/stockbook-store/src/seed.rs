//! # Seed Data
//!
//! Canned records written on the very first run so a fresh install has
//! something to look at.
//!
//! ## Demo Data
//! Realistic small-business data for an electronics reseller:
//! - 6 products (laptops, monitors, peripherals), ids `"1"`..`"6"`
//! - 4 customers (3 buyers, 1 supplier)
//! - 2 invoices (one paid, one pending)
//! - 5 ledger transactions (sales income, rent, utilities, stock purchase)
//!
//! Seeded records carry stable ids so they can reference each other.
//! Seeding writes records as they are; the paid demo invoice does not run
//! through posting (its income entry is already among the transactions).

use chrono::NaiveDate;
use stockbook_core::{
    Customer, Invoice, InvoiceItem, InvoiceStatus, Money, PartyRole, PaymentMethod, Product,
    TaxRate, Transaction, TransactionKind,
};

/// Records used to populate an empty store.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub products: Vec<Product>,
    pub invoices: Vec<Invoice>,
    pub transactions: Vec<Transaction>,
    pub customers: Vec<Customer>,
}

impl SeedData {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.invoices.is_empty()
            && self.transactions.is_empty()
            && self.customers.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.products.len() + self.invoices.len() + self.transactions.len() + self.customers.len()
    }
}

/// Supplies first-run records.
pub trait SeedProvider: Send + Sync {
    fn seed(&self) -> SeedData;
}

/// Seeds nothing; a first run starts empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeed;

impl SeedProvider for NoSeed {
    fn seed(&self) -> SeedData {
        SeedData::default()
    }
}

/// The built-in demo data set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSeed;

/// (id, name, sku, quantity, price, category, min_stock, tax_bps)
///
/// The laptop is untaxed; everything else carries 20% KDV.
const PRODUCTS: &[(&str, &str, &str, i64, i64, &str, i64, u32)] = &[
    ("1", "Laptop Pro 15", "LPT-001", 15, 25000, "Computers", 5, 0),
    ("2", "Wireless Mouse", "MSE-002", 50, 450, "Peripherals", 10, 2000),
    ("3", "Mechanical Keyboard", "KBD-003", 8, 1200, "Peripherals", 10, 2000),
    ("4", "27\" Monitor", "MON-004", 12, 7500, "Displays", 4, 2000),
    ("5", "USB-C Hub", "HUB-005", 3, 850, "Accessories", 5, 2000),
    ("6", "Laser Printer", "PRN-006", 6, 5400, "Office", 2, 2000),
];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn demo_products() -> Vec<Product> {
    PRODUCTS
        .iter()
        .map(|(id, name, sku, quantity, price, category, min_stock, tax_bps)| Product {
            id: id.to_string(),
            name: name.to_string(),
            sku: sku.to_string(),
            quantity: *quantity,
            price: Money::from_major(*price),
            category: category.to_string(),
            min_stock: *min_stock,
            tax_rate: TaxRate::from_bps(*tax_bps),
            image: None,
        })
        .collect()
}

fn demo_customers() -> Vec<Customer> {
    let party = |id: &str, name: &str, role, email: &str, tax_office: &str| Customer {
        id: id.to_string(),
        name: name.to_string(),
        role,
        email: Some(email.to_string()),
        phone: None,
        address: None,
        tax_number: None,
        tax_office: Some(tax_office.to_string()),
    };

    vec![
        party("1", "ABC Teknoloji Ltd.", PartyRole::Customer, "info@abctek.com", "Kadikoy"),
        party("2", "Yildiz Insaat A.S.", PartyRole::Customer, "muhasebe@yildiz.com", "Besiktas"),
        party("3", "Mavi Ofis Hizmetleri", PartyRole::Customer, "satin@maviofis.com", "Sisli"),
        party("4", "Delta Bilgisayar Toptan", PartyRole::Supplier, "siparis@delta.com", "Umraniye"),
    ]
}

fn demo_invoices(products: &[Product]) -> Vec<Invoice> {
    let line = |index: usize, qty: i64| InvoiceItem::from_product(&products[index], qty);

    let mut paid = Invoice::new(
        "ABC Teknoloji Ltd.",
        date(2025, 1, 10),
        InvoiceStatus::Paid,
        vec![line(0, 2), line(1, 4)],
    )
    .with_payment(PaymentMethod::Transfer, None)
    .with_customer_id("1");
    paid.id = "1".to_string();

    let mut pending = Invoice::new(
        "Yildiz Insaat A.S.",
        date(2025, 1, 18),
        InvoiceStatus::Pending,
        vec![line(3, 3)],
    )
    .with_payment(PaymentMethod::Check, Some(date(2025, 3, 18)))
    .with_customer_id("2");
    pending.id = "2".to_string();

    vec![paid, pending]
}

fn demo_transactions(invoices: &[Invoice]) -> Vec<Transaction> {
    let entry = |id: &str, description: &str, amount: Money, kind, on: NaiveDate| {
        let mut tx = Transaction::new(description, amount, kind, on);
        tx.id = id.to_string();
        tx
    };

    let mut sale = entry(
        "1",
        "Invoice payment - ABC Teknoloji Ltd.",
        invoices[0].amount,
        TransactionKind::Income,
        invoices[0].date,
    );
    sale.payment_method = invoices[0].payment_method;
    sale.invoice_id = Some(invoices[0].id.clone());

    vec![
        sale,
        entry("2", "Office rent - January", Money::from_major(15000), TransactionKind::Expense, date(2025, 1, 5)),
        entry("3", "Electricity and internet", Money::from_major(2300), TransactionKind::Expense, date(2025, 1, 12)),
        entry("4", "Installation service", Money::from_major(4000), TransactionKind::Income, date(2025, 1, 15)),
        entry("5", "Stock purchase - Delta Bilgisayar", Money::from_major(60000), TransactionKind::Expense, date(2025, 1, 20)),
    ]
}

impl SeedProvider for DemoSeed {
    fn seed(&self) -> SeedData {
        let products = demo_products();
        let invoices = demo_invoices(&products);
        let transactions = demo_transactions(&invoices);

        SeedData {
            products,
            invoices,
            transactions,
            customers: demo_customers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use stockbook_core::validation::{validate_invoice, validate_product};

    #[test]
    fn test_demo_seed_shape() {
        let data = DemoSeed.seed();

        assert_eq!(data.products.len(), 6);
        assert_eq!(data.invoices.len(), 2);
        assert_eq!(data.transactions.len(), 5);
        assert_eq!(data.customers.len(), 4);
        assert_eq!(data.record_count(), 17);

        let first = &data.products[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.price, Money::from_major(25000));
        assert_eq!(first.quantity, 15);
        assert_eq!(first.tax_rate, TaxRate::zero());
        assert_eq!(data.products[1].tax_rate, TaxRate::from_bps(2000));
    }

    #[test]
    fn test_demo_records_are_valid() {
        let data = DemoSeed.seed();

        for product in &data.products {
            assert!(validate_product(product).is_ok(), "{}", product.sku);
        }
        for invoice in &data.invoices {
            assert!(validate_invoice(invoice).is_ok(), "{}", invoice.id);
        }

        let ids: HashSet<_> = data.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), data.transactions.len());
    }

    #[test]
    fn test_no_seed_is_empty() {
        assert!(NoSeed.seed().is_empty());
    }
}
