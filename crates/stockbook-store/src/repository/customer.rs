//! # Customer Repository
//!
//! Customers and suppliers share one collection, split by [`PartyRole`].

use stockbook_core::{reports, Customer, Money, PartyRole};

use super::CollectionRepository;
use crate::cache::LedgerCache;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    cache: LedgerCache,
}

impl CustomerRepository {
    pub fn new(cache: LedgerCache) -> Self {
        CustomerRepository { cache }
    }

    fn with_role(&self, role: PartyRole) -> Vec<Customer> {
        self.cache.read(|state| {
            state
                .customers
                .iter()
                .filter(|c| c.role == role)
                .cloned()
                .collect()
        })
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.with_role(PartyRole::Customer)
    }

    pub fn suppliers(&self) -> Vec<Customer> {
        self.with_role(PartyRole::Supplier)
    }

    /// Unpaid invoice total for `customer`.
    ///
    /// See [`reports::invoice_belongs_to`] for how invoices are matched.
    pub fn balance(&self, customer: &Customer) -> Money {
        self.cache
            .read(|state| reports::customer_balance(customer, &state.invoices))
    }
}

impl CollectionRepository for CustomerRepository {
    type Record = Customer;

    fn cache(&self) -> &LedgerCache {
        &self.cache
    }
}
