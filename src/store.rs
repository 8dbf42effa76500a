//! Storage port for installments and payments.
//!
//! Real persistence lives outside the engine; this module defines the
//! contract the engine needs and ships `MemoryStore` as the reference
//! implementation. The contract carries three guarantees the engine's
//! concurrency model relies on:
//!
//! - schedule insertion is check-then-insert atomic per loan (write-once)
//! - transaction-reference uniqueness is enforced at insertion, as the
//!   final guard behind any earlier existence check
//! - status updates are atomic per installment row
//!
//! Reads return owned snapshots; aggregations never hold a lock across
//! their own iteration.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::errors::{EmiError, Result};
use crate::types::{
    CustomerId, EmiStatus, Installment, InstallmentId, LoanId, Payment, PaymentId,
};

pub trait EmiStore: Send + Sync {
    /// Persist a freshly generated schedule. Fails with `AlreadyExists`
    /// if any schedule was already inserted for the same loan.
    fn insert_schedule(&self, installments: Vec<Installment>) -> Result<()>;

    fn installment(&self, id: InstallmentId) -> Result<Option<Installment>>;

    /// all installments of a loan, ordered by emi_number ascending
    fn installments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Installment>>;

    /// all installments of a customer, ordered by due date ascending
    fn installments_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Installment>>;

    fn all_installments(&self) -> Result<Vec<Installment>>;

    /// atomic per-row status update
    fn update_status(
        &self,
        id: InstallmentId,
        status: EmiStatus,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Bulk overdue reclassification. Rows whose status changed since
    /// selection (e.g. paid concurrently) are skipped; returns the ids
    /// actually transitioned.
    fn mark_overdue(&self, ids: &[InstallmentId], now: DateTime<Utc>)
        -> Result<Vec<InstallmentId>>;

    /// Persist a payment record. Fails with `DuplicateReference` if the
    /// transaction reference is already present.
    fn insert_payment(&self, payment: Payment) -> Result<()>;

    fn payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    fn payment_by_reference(&self, reference: &str) -> Result<Option<Payment>>;

    /// payments of a loan, newest payment date first
    fn payments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Payment>>;

    /// payments with payment_date in [from, to] inclusive
    fn payments_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Payment>>;
}

#[derive(Debug, Default)]
struct Inner {
    installments: HashMap<InstallmentId, Installment>,
    loans: HashMap<LoanId, Vec<InstallmentId>>,
    payments: HashMap<PaymentId, Payment>,
    references: HashMap<String, PaymentId>,
}

/// In-memory store. A single mutex guards all state, which trivially gives
/// the per-row and check-then-insert atomicity the contract requires.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| EmiError::StoreFailure {
            message: "store lock poisoned".to_string(),
        })
    }
}

impl EmiStore for MemoryStore {
    fn insert_schedule(&self, installments: Vec<Installment>) -> Result<()> {
        let loan_id = match installments.first() {
            Some(first) => first.loan_id,
            None => {
                return Err(EmiError::InvalidInput {
                    message: "cannot insert an empty schedule".to_string(),
                })
            }
        };

        let mut inner = self.guard()?;
        if inner.loans.contains_key(&loan_id) {
            return Err(EmiError::AlreadyExists { loan_id });
        }

        let ids = installments.iter().map(|i| i.id).collect();
        for installment in installments {
            inner.installments.insert(installment.id, installment);
        }
        inner.loans.insert(loan_id, ids);
        Ok(())
    }

    fn installment(&self, id: InstallmentId) -> Result<Option<Installment>> {
        Ok(self.guard()?.installments.get(&id).cloned())
    }

    fn installments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        let inner = self.guard()?;
        let mut rows: Vec<Installment> = inner
            .loans
            .get(&loan_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.installments.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|i| i.emi_number);
        Ok(rows)
    }

    fn installments_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Installment>> {
        let inner = self.guard()?;
        let mut rows: Vec<Installment> = inner
            .installments
            .values()
            .filter(|i| i.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| (i.due_date, i.emi_number));
        Ok(rows)
    }

    fn all_installments(&self) -> Result<Vec<Installment>> {
        Ok(self.guard()?.installments.values().cloned().collect())
    }

    fn update_status(
        &self,
        id: InstallmentId,
        status: EmiStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.guard()?;
        let installment = inner
            .installments
            .get_mut(&id)
            .ok_or(EmiError::NotFound {
                entity: "installment",
                id,
            })?;
        installment.status = status;
        installment.updated_at = now;
        Ok(())
    }

    fn mark_overdue(
        &self,
        ids: &[InstallmentId],
        now: DateTime<Utc>,
    ) -> Result<Vec<InstallmentId>> {
        let mut inner = self.guard()?;
        let mut transitioned = Vec::new();
        for id in ids {
            if let Some(installment) = inner.installments.get_mut(id) {
                if installment.status.is_sweepable() {
                    installment.status =
                        installment.status.transition(crate::types::EmiEvent::DueDatePassed);
                    installment.updated_at = now;
                    transitioned.push(*id);
                }
            }
        }
        Ok(transitioned)
    }

    fn insert_payment(&self, payment: Payment) -> Result<()> {
        let mut inner = self.guard()?;
        if let Some(reference) = &payment.transaction_reference {
            if inner.references.contains_key(reference) {
                return Err(EmiError::DuplicateReference {
                    reference: reference.clone(),
                });
            }
            inner.references.insert(reference.clone(), payment.id);
        }
        inner.payments.insert(payment.id, payment);
        Ok(())
    }

    fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.guard()?.payments.get(&id).cloned())
    }

    fn payment_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        let inner = self.guard()?;
        Ok(inner
            .references
            .get(reference)
            .and_then(|id| inner.payments.get(id).cloned()))
    }

    fn payments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        let inner = self.guard()?;
        let mut rows: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(rows)
    }

    fn payments_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Payment>> {
        let inner = self.guard()?;
        let mut rows: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| p.payment_date >= from && p.payment_date <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.payment_date);
        Ok(rows)
    }
}
