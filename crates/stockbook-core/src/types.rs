//! # Domain Types
//!
//! Entity records held by the cache and mirrored to the durable store.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐    │
//! │  │  Product    │  │  Invoice    │  │ Transaction │  │  Customer   │    │
//! │  │  sku        │  │  items[] ◄──┼──│ (ledger)    │  │  role       │    │
//! │  │  quantity   │  │  status     │  │  kind       │  │  name       │    │
//! │  │  min_stock  │  │  amount     │  │  amount     │  │             │    │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └─────────────┘    │
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐    │
//! │  │  Proposal   │  │  Employee   │  │ AppSettings │  │ CompanyInfo │    │
//! │  │ valid_until │  │  salary     │  │ (singleton) │  │ (singleton) │    │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └─────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every collection record is identified by a string `id` that is unique
//! within its collection. Records serialize with camelCase keys, which is
//! the shape persisted in the durable store and in backup documents.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Collections
// =============================================================================

/// Named record collections, one per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Products,
    Invoices,
    Transactions,
    Customers,
    Proposals,
    Employees,
}

impl Collection {
    /// All collections in hydration order.
    pub const ALL: [Collection; 6] = [
        Collection::Products,
        Collection::Invoices,
        Collection::Transactions,
        Collection::Customers,
        Collection::Proposals,
        Collection::Employees,
    ];

    /// Physical table / store name for this collection.
    pub const fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Invoices => "invoices",
            Collection::Transactions => "transactions",
            Collection::Customers => "customers",
            Collection::Proposals => "proposals",
            Collection::Employees => "employees",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownCollection(s.to_string()))
    }
}

/// A record that lives in one of the [`Collection`]s.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The collection this record type belongs to.
    const COLLECTION: Collection;

    /// The record's identifier.
    fn id(&self) -> &str;

    /// Replaces the record's identifier (ids are assigned by the store).
    fn set_id(&mut self, id: String);
}

macro_rules! impl_entity {
    ($ty:ty, $collection:expr) => {
        impl Entity for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18%. Serialized as the bare
/// integer: `"taxRate": 2000` is 20%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked item.
///
/// `quantity` is signed: posting an invoice for more than is on hand
/// drives it below zero rather than being clamped or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Stock-keeping code.
    pub sku: String,
    /// On-hand quantity.
    pub quantity: i64,
    /// Unit price.
    pub price: Money,
    /// Free-form category label.
    pub category: String,
    /// Threshold at or below which the product counts as low stock.
    pub min_stock: i64,
    pub tax_rate: TaxRate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl_entity!(Product, Collection::Products);

impl Product {
    /// True when on-hand quantity has reached the minimum-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }

    /// Value of on-hand stock at unit price (negative stock counts as zero).
    pub fn stock_value(&self) -> Money {
        self.price.multiply_quantity(self.quantity.max(0))
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Whether a party buys from us or sells to us.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PartyRole {
    #[default]
    Customer,
    Supplier,
}

/// A customer or supplier.
///
/// Names are not unique. Invoices reference customers by name, optionally
/// backed by `customer_id` on newer records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: PartyRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_office: Option<String>,
}

impl_entity!(Customer, Collection::Customers);

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Check,
    PromissoryNote,
}

impl PaymentMethod {
    /// Deferred instruments must carry a maturity date.
    pub const fn requires_maturity(&self) -> bool {
        matches!(self, PaymentMethod::Check | PaymentMethod::PromissoryNote)
    }
}

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

impl InvoiceStatus {
    #[inline]
    pub const fn is_paid(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }
}

/// A line on an invoice or proposal.
///
/// Uses the snapshot pattern: price, tax rate and product name are frozen at
/// the time the line is written, so later product edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    /// `unit_price × quantity × (1 + tax_rate)`.
    pub total: Money,
}

impl InvoiceItem {
    /// Builds a line and computes its total.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        tax_rate: TaxRate,
    ) -> Self {
        let total = line_total(unit_price, quantity, tax_rate);
        InvoiceItem {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            tax_rate,
            total,
        }
    }

    /// Builds a line from a product at its current price and tax rate.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        InvoiceItem::new(
            product.id.clone(),
            product.name.clone(),
            quantity,
            product.price,
            product.tax_rate,
        )
    }

    /// Recomputes the line total from its parts.
    pub fn computed_total(&self) -> Money {
        line_total(self.unit_price, self.quantity, self.tax_rate)
    }
}

fn line_total(unit_price: Money, quantity: i64, tax_rate: TaxRate) -> Money {
    let net = unit_price.multiply_quantity(quantity);
    net + net.calculate_tax(tax_rate)
}

/// Sums line totals.
pub fn items_total(items: &[InvoiceItem]) -> Money {
    items.iter().map(|i| i.total).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Free-text customer name (not a foreign key).
    pub customer_name: String,
    /// Optional link to a [`Customer`] record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Equals the sum of item totals at creation time.
    pub amount: Money,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub items: Vec<InvoiceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub maturity_date: Option<NaiveDate>,
}

impl_entity!(Invoice, Collection::Invoices);

impl Invoice {
    /// Creates an invoice whose amount is the sum of its items.
    ///
    /// The id is left empty; the invoice repository assigns one on add.
    pub fn new(
        customer_name: impl Into<String>,
        date: NaiveDate,
        status: InvoiceStatus,
        items: Vec<InvoiceItem>,
    ) -> Self {
        let amount = items_total(&items);
        Invoice {
            id: String::new(),
            customer_name: customer_name.into(),
            customer_id: None,
            date,
            amount,
            status,
            items,
            payment_method: None,
            maturity_date: None,
        }
    }

    /// Sets the payment method and (for deferred instruments) maturity date.
    pub fn with_payment(mut self, method: PaymentMethod, maturity: Option<NaiveDate>) -> Self {
        self.payment_method = Some(method);
        self.maturity_date = maturity;
        self
    }

    /// Links the invoice to a customer record.
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Sum of the line totals.
    pub fn items_total(&self) -> Money {
        items_total(&self.items)
    }
}

// =============================================================================
// Proposal
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ProposalStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

/// A price quote. Same shape as an invoice plus validity date and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Proposal {
    pub id: String,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub valid_until: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub status: ProposalStatus,
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub maturity_date: Option<NaiveDate>,
}

impl_entity!(Proposal, Collection::Proposals);

impl Proposal {
    /// Creates a draft proposal whose amount is the sum of its items.
    pub fn new(
        customer_name: impl Into<String>,
        date: NaiveDate,
        valid_until: NaiveDate,
        items: Vec<InvoiceItem>,
    ) -> Self {
        let amount = items_total(&items);
        Proposal {
            id: String::new(),
            customer_name: customer_name.into(),
            customer_id: None,
            date,
            valid_until,
            amount,
            status: ProposalStatus::Draft,
            items,
            notes: String::new(),
            payment_method: None,
            maturity_date: None,
        }
    }

    /// Builds the pending invoice this proposal turns into when accepted.
    ///
    /// The invoice is never created paid: stock only moves once the invoice
    /// itself is posted.
    pub fn to_invoice(&self, date: NaiveDate) -> Invoice {
        Invoice {
            id: String::new(),
            customer_name: self.customer_name.clone(),
            customer_id: self.customer_id.clone(),
            date,
            amount: self.amount,
            status: InvoiceStatus::Pending,
            items: self.items.clone(),
            payment_method: self.payment_method,
            maturity_date: self.maturity_date,
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A ledger entry. Invoice postings and salary payments are recorded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: Money,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub maturity_date: Option<NaiveDate>,
    /// Invoice that produced this entry, when it was derived by posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
}

impl_entity!(Transaction, Collection::Transactions);

impl Transaction {
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        kind: TransactionKind,
        date: NaiveDate,
    ) -> Self {
        Transaction {
            id: String::new(),
            description: description.into(),
            amount,
            kind,
            date,
            payment_method: None,
            maturity_date: None,
            invoice_id: None,
        }
    }
}

// =============================================================================
// Employee
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub full_name: String,
    pub position: String,
    /// Monthly salary.
    pub salary: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub status: EmployeeStatus,
}

impl_entity!(Employee, Collection::Employees);

// =============================================================================
// Singletons
// =============================================================================

/// Application preferences, persisted under the `app_settings` metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AppSettings {
    /// ISO 4217 currency code used for display.
    pub currency: String,
    pub language: String,
    /// Tax rate pre-filled on new products and invoice lines.
    pub default_tax_rate: TaxRate,
    pub low_stock_alerts: bool,
    pub dark_mode: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            currency: "TRY".to_string(),
            language: "tr".to_string(),
            default_tax_rate: TaxRate::from_bps(2000),
            low_stock_alerts: true,
            dark_mode: false,
        }
    }
}

/// Company letterhead, persisted under the `company_info` metadata key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub tax_number: String,
    pub tax_office: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(18.0).bps(), 1800);
        assert!((TaxRate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_line_total_includes_tax() {
        let item = InvoiceItem::new("1", "Laptop", 2, Money::from_major(100), TaxRate::from_bps(1800));
        assert_eq!(item.total, Money::from_major(236));
        assert_eq!(item.computed_total(), item.total);
    }

    #[test]
    fn test_invoice_amount_is_sum_of_items() {
        let items = vec![
            InvoiceItem::new("1", "A", 1, Money::from_major(10), TaxRate::zero()),
            InvoiceItem::new("2", "B", 3, Money::from_major(5), TaxRate::zero()),
        ];
        let invoice = Invoice::new("ABC", date(2026, 1, 2), InvoiceStatus::Pending, items);
        assert_eq!(invoice.amount, Money::from_major(25));
        assert_eq!(invoice.items_total(), invoice.amount);
    }

    #[test]
    fn test_proposal_converts_to_pending_invoice() {
        let items = vec![InvoiceItem::new("1", "A", 4, Money::from_major(10), TaxRate::zero())];
        let mut proposal = Proposal::new("ABC", date(2026, 1, 1), date(2026, 2, 1), items);
        proposal.customer_id = Some("c1".into());

        let invoice = proposal.to_invoice(date(2026, 1, 5));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.amount, proposal.amount);
        assert_eq!(invoice.items, proposal.items);
        assert_eq!(invoice.customer_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_collection_parsing() {
        assert_eq!("Invoices".parse::<Collection>().unwrap(), Collection::Invoices);
        assert!("widgets".parse::<Collection>().is_err());
    }

    #[test]
    fn test_transaction_kind_serializes_as_type() {
        let tx = Transaction::new("Rent", Money::from_major(10), TransactionKind::Expense, date(2026, 1, 1));
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2026-01-01");
        assert!(json.get("invoiceId").is_none());
    }

    #[test]
    fn test_payment_method_maturity_requirement() {
        assert!(PaymentMethod::Check.requires_maturity());
        assert!(PaymentMethod::PromissoryNote.requires_maturity());
        assert!(!PaymentMethod::Cash.requires_maturity());
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let mut product = Product {
            id: "1".into(),
            name: "Mouse".into(),
            sku: "MS-1".into(),
            quantity: 5,
            price: Money::from_major(3),
            category: "Accessories".into(),
            min_stock: 5,
            tax_rate: TaxRate::zero(),
            image: None,
        };
        assert!(product.is_low_stock());
        product.quantity = -2;
        assert_eq!(product.stock_value(), Money::zero());
    }
}
