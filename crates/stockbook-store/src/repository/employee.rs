//! # Employee Repository
//!
//! Staff records and salary payments. A salary payment is an expense entry
//! in the ledger; the employee record itself is not changed.

use chrono::NaiveDate;
use stockbook_core::posting::salary_expense;
use stockbook_core::{Employee, EmployeeStatus, Transaction};
use tracing::{debug, info};

use super::{insert_record, CollectionRepository};
use crate::cache::LedgerCache;

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    cache: LedgerCache,
}

impl EmployeeRepository {
    pub fn new(cache: LedgerCache) -> Self {
        EmployeeRepository { cache }
    }

    pub fn active(&self) -> Vec<Employee> {
        self.cache.read(|state| {
            state
                .employees
                .iter()
                .filter(|e| e.status == EmployeeStatus::Active)
                .cloned()
                .collect()
        })
    }

    /// Records one salary payment for an active employee.
    ///
    /// ## Returns
    /// The appended expense entry, or `None` if the employee is unknown or
    /// inactive.
    pub fn pay_salary(&self, id: &str, date: NaiveDate) -> Option<Transaction> {
        self.cache.write(|state, changes| {
            let employee = state.employees.iter().find(|e| e.id == id)?;
            if employee.status != EmployeeStatus::Active {
                debug!(id, "Inactive employee; salary not paid");
                return None;
            }

            let mut expense = salary_expense(&employee.full_name, employee.salary, date, String::new());
            expense.id = insert_record(state, changes, expense.clone());

            info!(employee_id = id, transaction_id = %expense.id, amount = %expense.amount, "Salary paid");
            Some(expense)
        })
    }
}

impl CollectionRepository for EmployeeRepository {
    type Record = Employee;

    fn cache(&self) -> &LedgerCache {
        &self.cache
    }
}
