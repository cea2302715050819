//! # Invoice Repository
//!
//! Invoices plus the cross-collection posting protocol.
//!
//! ## Posting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add(invoice{status: paid})          one cache lock, one unit          │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────────────┐   ┌────────────────────┐  │
//! │  │  invoices    │   │  products            │   │  transactions      │  │
//! │  │  + invoice   │   │  qty -= line qty     │   │  + income entry    │  │
//! │  └──────┬───────┘   └──────────┬───────────┘   └─────────┬──────────┘  │
//! │         └──────────────────────┼─────────────────────────┘             │
//! │                                ▼                                        │
//! │             3 write-throughs queued, lock released                     │
//! │                                                                         │
//! │  update(paid → pending/overdue)   products qty += previous line qty    │
//! │                                   (income entry is kept)               │
//! │  update(pending/overdue → paid)   same effects as a paid add           │
//! │  update(paid → paid, lines edited) qty += previous, qty -= edited      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers never see an invoice without its stock and ledger effects:
//! everything happens inside a single `LedgerCache::write`.

use stockbook_core::posting::{
    apply_movements, derived_income, restore_movements, sale_movements, StatusTransition,
};
use stockbook_core::{Collection, Invoice, InvoiceStatus};
use tracing::{debug, info};

use super::{insert_record, remove_record, replace_record, CollectionRepository};
use crate::cache::{CacheState, Changes, LedgerCache};

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    cache: LedgerCache,
}

impl InvoiceRepository {
    pub fn new(cache: LedgerCache) -> Self {
        InvoiceRepository { cache }
    }

    pub fn by_status(&self, status: InvoiceStatus) -> Vec<Invoice> {
        self.cache.read(|state| {
            state
                .invoices
                .iter()
                .filter(|i| i.status == status)
                .cloned()
                .collect()
        })
    }

    /// Changes only the status of an invoice, with posting effects.
    ///
    /// ## Returns
    /// The updated invoice, or `None` if no invoice has `id`.
    pub fn set_status(&self, id: &str, status: InvoiceStatus) -> Option<Invoice> {
        let mut invoice = self.get_by_id(id)?;
        invoice.status = status;
        self.update(invoice.clone());
        Some(invoice)
    }
}

impl CollectionRepository for InvoiceRepository {
    type Record = Invoice;

    fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    /// Appends the invoice; a paid invoice is posted in the same step.
    fn add(&self, invoice: Invoice) -> Vec<Invoice> {
        self.cache.write(|state, changes| {
            insert_invoice(state, changes, invoice);
            state.invoices.clone()
        })
    }

    /// Replaces the invoice and applies the effects of its status change.
    ///
    /// Line edits on an invoice that stays paid move stock by the
    /// difference, so a later downgrade restores exactly what is held.
    fn update(&self, invoice: Invoice) -> Vec<Invoice> {
        self.cache.write(|state, changes| {
            let next_status = invoice.status;
            let current = invoice.clone();

            if let Some(previous) = replace_record(state, changes, invoice) {
                match StatusTransition::between(Some(previous.status), next_status) {
                    StatusTransition::Post => post(state, changes, &current),
                    StatusTransition::Unpost => unpost(state, changes, &previous),
                    StatusTransition::Unchanged if next_status.is_paid() => {
                        repost(state, changes, &previous, &current)
                    }
                    StatusTransition::Unchanged => {}
                }
            }

            state.invoices.clone()
        })
    }

    /// Removes the invoice. Stock and ledger are left as they are.
    fn delete(&self, id: &str) -> Vec<Invoice> {
        self.cache.write(|state, changes| {
            remove_record::<Invoice>(state, changes, id);
            state.invoices.clone()
        })
    }
}

// =============================================================================
// Posting
// =============================================================================

/// Inserts an invoice under a new id, posting it if it is already paid.
///
/// ## Returns
/// The invoice as stored.
pub(crate) fn insert_invoice(
    state: &mut CacheState,
    changes: &mut Changes,
    invoice: Invoice,
) -> Invoice {
    let transition = StatusTransition::between(None, invoice.status);
    let mut stored = invoice.clone();
    stored.id = insert_record(state, changes, invoice);

    if transition == StatusTransition::Post {
        post(state, changes, &stored);
    }

    stored
}

/// Decrements stock for every line and appends the income entry.
fn post(state: &mut CacheState, changes: &mut Changes, invoice: &Invoice) {
    let moved = apply_movements(&mut state.products, &sale_movements(invoice));
    if moved > 0 {
        changes.touch(Collection::Products);
    }

    let income = derived_income(invoice, String::new());
    let transaction_id = insert_record(state, changes, income);

    info!(
        invoice_id = %invoice.id,
        transaction_id = %transaction_id,
        amount = %invoice.amount,
        lines = invoice.items.len(),
        "Invoice posted"
    );
}

/// Returns stock taken by a previous posting. The income entry stays.
fn unpost(state: &mut CacheState, changes: &mut Changes, previous: &Invoice) {
    let moved = apply_movements(&mut state.products, &restore_movements(previous));
    if moved > 0 {
        changes.touch(Collection::Products);
    }

    info!(invoice_id = %previous.id, lines = previous.items.len(), "Invoice unposted; stock restored");
}

/// Moves stock from a paid invoice's old lines to its edited lines.
/// The income entry is left as it is.
fn repost(state: &mut CacheState, changes: &mut Changes, previous: &Invoice, current: &Invoice) {
    if previous.items == current.items {
        return;
    }

    let mut movements = restore_movements(previous);
    movements.extend(sale_movements(current));
    if apply_movements(&mut state.products, &movements) > 0 {
        changes.touch(Collection::Products);
    }

    debug!(invoice_id = %current.id, "Paid invoice lines edited; stock moved");
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use chrono::NaiveDate;
    use stockbook_core::{InvoiceItem, Money, TaxRate, TransactionKind};

    fn invoice(lines: &[(&str, i64)], status: InvoiceStatus) -> Invoice {
        let items = lines
            .iter()
            .map(|(id, qty)| InvoiceItem::new(*id, "", *qty, Money::from_major(100), TaxRate::zero()))
            .collect();
        Invoice::new(
            "ABC",
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            status,
            items,
        )
    }

    fn quantity(cache: &LedgerCache, id: &str) -> i64 {
        cache.products().get_by_id(id).unwrap().quantity
    }

    #[tokio::test]
    async fn test_paid_add_posts_stock_and_income() {
        let (cache, _) = test_support::cache(true).await;
        let before = cache.transactions().count();

        let invoices = cache
            .invoices()
            .add(invoice(&[("2", 5), ("3", 1)], InvoiceStatus::Paid));
        let added = invoices.last().unwrap();

        assert_eq!(quantity(&cache, "2"), 45);
        assert_eq!(quantity(&cache, "3"), 7);

        let transactions = cache.transactions().get_all();
        assert_eq!(transactions.len(), before + 1);
        let income = transactions.last().unwrap();
        assert_eq!(income.kind, TransactionKind::Income);
        assert_eq!(income.amount, added.amount);
        assert_eq!(income.invoice_id.as_deref(), Some(added.id.as_str()));
    }

    #[tokio::test]
    async fn test_pending_add_has_no_effects() {
        let (cache, _) = test_support::cache(true).await;
        let before = cache.transactions().count();

        cache
            .invoices()
            .add(invoice(&[("2", 5)], InvoiceStatus::Pending));

        assert_eq!(quantity(&cache, "2"), 50);
        assert_eq!(cache.transactions().count(), before);
    }

    #[tokio::test]
    async fn test_overselling_goes_negative() {
        let (cache, _) = test_support::cache(true).await;

        // Seed product 3 has 8 on hand
        cache
            .invoices()
            .add(invoice(&[("3", 15)], InvoiceStatus::Paid));

        assert_eq!(quantity(&cache, "3"), -7);
    }

    #[tokio::test]
    async fn test_downgrade_restores_stock_keeps_income() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.invoices();

        let id = repo
            .add(invoice(&[("2", 4)], InvoiceStatus::Paid))
            .last()
            .unwrap()
            .id
            .clone();
        let transactions = cache.transactions().count();
        assert_eq!(quantity(&cache, "2"), 46);

        repo.set_status(&id, InvoiceStatus::Pending).unwrap();

        assert_eq!(quantity(&cache, "2"), 50);
        assert_eq!(cache.transactions().count(), transactions);
        assert_eq!(cache.transactions().for_invoice(&id).len(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_to_paid_posts_once() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.invoices();
        let before = cache.transactions().count();

        let id = repo
            .add(invoice(&[("4", 2)], InvoiceStatus::Overdue))
            .last()
            .unwrap()
            .id
            .clone();

        repo.set_status(&id, InvoiceStatus::Paid).unwrap();
        repo.set_status(&id, InvoiceStatus::Paid).unwrap();

        assert_eq!(quantity(&cache, "4"), 10);
        assert_eq!(cache.transactions().count(), before + 1);
    }

    #[tokio::test]
    async fn test_line_edit_on_paid_invoice_then_downgrade_restores_stock() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.invoices();
        let transactions = cache.transactions().count();

        let mut stored = repo
            .add(invoice(&[("2", 4)], InvoiceStatus::Paid))
            .last()
            .unwrap()
            .clone();
        assert_eq!(quantity(&cache, "2"), 46);

        stored.items = invoice(&[("2", 1), ("4", 2)], InvoiceStatus::Paid).items;
        repo.update(stored.clone());
        assert_eq!(quantity(&cache, "2"), 49);
        assert_eq!(quantity(&cache, "4"), 10);

        repo.set_status(&stored.id, InvoiceStatus::Pending).unwrap();

        assert_eq!(quantity(&cache, "2"), 50);
        assert_eq!(quantity(&cache, "4"), 12);
        assert_eq!(cache.transactions().count(), transactions + 1);
    }

    #[tokio::test]
    async fn test_paid_update_without_line_change_leaves_products_alone() {
        let (cache, store) = test_support::cache(true).await;
        let repo = cache.invoices();
        let mut stored = repo
            .add(invoice(&[("2", 4)], InvoiceStatus::Paid))
            .last()
            .unwrap()
            .clone();
        cache.sink().flush().await.unwrap();
        let before = store.replace_count();

        stored.customer_name = "ABC Ltd.".to_string();
        repo.update(stored);
        cache.sink().flush().await.unwrap();

        assert_eq!(quantity(&cache, "2"), 46);
        assert_eq!(store.replace_count(), before + 1);
    }

    #[tokio::test]
    async fn test_delete_paid_invoice_keeps_effects() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.invoices();

        let id = repo
            .add(invoice(&[("2", 1)], InvoiceStatus::Paid))
            .last()
            .unwrap()
            .id
            .clone();
        let remaining = repo.delete(&id);

        assert_eq!(remaining.len(), 2);
        assert_eq!(quantity(&cache, "2"), 49);
        assert_eq!(cache.transactions().for_invoice(&id).len(), 1);
    }

    #[tokio::test]
    async fn test_posting_writes_each_collection_once() {
        let (cache, store) = test_support::cache(true).await;
        cache.sink().flush().await.unwrap();
        let before = store.replace_count();

        cache
            .invoices()
            .add(invoice(&[("1", 1)], InvoiceStatus::Paid));
        cache.sink().flush().await.unwrap();

        // invoices + products + transactions
        assert_eq!(store.replace_count(), before + 3);
    }
}
