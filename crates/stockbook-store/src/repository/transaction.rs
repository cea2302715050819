//! # Transaction Repository
//!
//! The single ledger. Manual entries are added here; invoice postings and
//! salary payments append through their own repositories.

use stockbook_core::{reports, Money, Transaction, TransactionKind};

use super::CollectionRepository;
use crate::cache::LedgerCache;

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    cache: LedgerCache,
}

impl TransactionRepository {
    pub fn new(cache: LedgerCache) -> Self {
        TransactionRepository { cache }
    }

    pub fn income_total(&self) -> Money {
        self.cache
            .read(|state| reports::sum_kind(&state.transactions, TransactionKind::Income))
    }

    pub fn expense_total(&self) -> Money {
        self.cache
            .read(|state| reports::sum_kind(&state.transactions, TransactionKind::Expense))
    }

    /// Entries derived from posting the given invoice.
    pub fn for_invoice(&self, invoice_id: &str) -> Vec<Transaction> {
        self.cache.read(|state| {
            state
                .transactions
                .iter()
                .filter(|t| t.invoice_id.as_deref() == Some(invoice_id))
                .cloned()
                .collect()
        })
    }
}

impl CollectionRepository for TransactionRepository {
    type Record = Transaction;

    fn cache(&self) -> &LedgerCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_totals_follow_mutations() {
        let (cache, _) = test_support::cache(false).await;
        let repo = cache.transactions();
        let day = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        repo.add(Transaction::new("Consulting", Money::from_major(900), TransactionKind::Income, day));
        let all = repo.add(Transaction::new("Rent", Money::from_major(400), TransactionKind::Expense, day));

        assert_eq!(repo.income_total(), Money::from_major(900));
        assert_eq!(repo.expense_total(), Money::from_major(400));

        repo.delete(&all[1].id);
        assert_eq!(repo.expense_total(), Money::zero());
    }

    #[tokio::test]
    async fn test_demo_income_links_to_invoice() {
        let (cache, _) = test_support::cache(true).await;

        let linked = cache.transactions().for_invoice("1");
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].kind, TransactionKind::Income);
    }
}
