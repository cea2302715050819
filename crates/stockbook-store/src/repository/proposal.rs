//! # Proposal Repository
//!
//! Price quotes, and their conversion into invoices.
//!
//! ## Conversion
//! ```text
//! Proposal{draft|sent|rejected}
//!      │  convert_to_invoice(id, date)
//!      ▼
//! ┌───────────────────────┐      ┌──────────────────────────────┐
//! │ Proposal{accepted}    │      │ Invoice{pending}             │
//! │ (same id)             │      │ items/amount/customer copied │
//! └───────────────────────┘      └──────────────┬───────────────┘
//!                                               │ later: status → paid
//!                                               ▼
//!                                   stock decremented, income added
//! ```
//!
//! Stock never moves at conversion time.

use chrono::NaiveDate;
use stockbook_core::{Collection, Invoice, Proposal, ProposalStatus};
use tracing::{debug, info};

use super::invoice::insert_invoice;
use super::CollectionRepository;
use crate::cache::LedgerCache;

#[derive(Debug, Clone)]
pub struct ProposalRepository {
    cache: LedgerCache,
}

impl ProposalRepository {
    pub fn new(cache: LedgerCache) -> Self {
        ProposalRepository { cache }
    }

    pub fn by_status(&self, status: ProposalStatus) -> Vec<Proposal> {
        self.cache.read(|state| {
            state
                .proposals
                .iter()
                .filter(|p| p.status == status)
                .cloned()
                .collect()
        })
    }

    /// Turns a proposal into a pending invoice dated `date`.
    ///
    /// The proposal is marked accepted in the same step, so a second
    /// conversion of the same proposal is refused.
    ///
    /// ## Returns
    /// The new invoice, or `None` if the proposal is unknown or already
    /// accepted.
    pub fn convert_to_invoice(&self, id: &str, date: NaiveDate) -> Option<Invoice> {
        self.cache.write(|state, changes| {
            let proposal = state.proposals.iter_mut().find(|p| p.id == id)?;
            if proposal.status == ProposalStatus::Accepted {
                debug!(id, "Proposal already accepted; not converting again");
                return None;
            }

            proposal.status = ProposalStatus::Accepted;
            let draft = proposal.to_invoice(date);
            changes.touch(Collection::Proposals);

            let invoice = insert_invoice(state, changes, draft);
            info!(proposal_id = id, invoice_id = %invoice.id, amount = %invoice.amount, "Proposal converted");
            Some(invoice)
        })
    }
}

impl CollectionRepository for ProposalRepository {
    type Record = Proposal;

    fn cache(&self) -> &LedgerCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use stockbook_core::{InvoiceItem, InvoiceStatus, Money, TaxRate};

    fn quote(product_id: &str, qty: i64) -> Proposal {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut proposal = Proposal::new(
            "Yildiz Insaat",
            day,
            day + chrono::Duration::days(30),
            vec![InvoiceItem::new(product_id, "Monitor", qty, Money::from_major(7500), TaxRate::from_bps(2000))],
        );
        proposal.customer_id = Some("2".to_string());
        proposal.status = ProposalStatus::Sent;
        proposal
    }

    #[tokio::test]
    async fn test_conversion_creates_pending_invoice_without_stock_change() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.proposals();
        let id = repo.add(quote("4", 2))[0].id.clone();
        let transactions = cache.transactions().count();

        let day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let invoice = repo.convert_to_invoice(&id, day).unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.date, day);
        assert_eq!(invoice.amount, Money::from_major(18000));
        assert_eq!(invoice.customer_id.as_deref(), Some("2"));
        assert_eq!(cache.invoices().count(), 3);
        assert_eq!(cache.products().get_by_id("4").unwrap().quantity, 12);
        assert_eq!(cache.transactions().count(), transactions);
        assert_eq!(repo.get_by_id(&id).unwrap().status, ProposalStatus::Accepted);
    }

    #[tokio::test]
    async fn test_converted_invoice_posts_once_when_paid() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.proposals();
        let id = repo.add(quote("4", 2))[0].id.clone();

        let day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let invoice = repo.convert_to_invoice(&id, day).unwrap();
        cache.invoices().set_status(&invoice.id, InvoiceStatus::Paid);

        assert_eq!(cache.products().get_by_id("4").unwrap().quantity, 10);
        assert_eq!(cache.transactions().for_invoice(&invoice.id).len(), 1);
    }

    #[tokio::test]
    async fn test_second_conversion_is_refused() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.proposals();
        let id = repo.add(quote("4", 1))[0].id.clone();
        let day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();

        assert!(repo.convert_to_invoice(&id, day).is_some());
        assert!(repo.convert_to_invoice(&id, day).is_none());
        assert!(repo.convert_to_invoice("missing", day).is_none());
        assert_eq!(cache.invoices().count(), 3);
        assert_eq!(repo.by_status(ProposalStatus::Accepted).len(), 1);
    }
}
