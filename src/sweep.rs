//! Periodic batch reclassification of stale installments.
//!
//! Driven by a timer owned by the caller (cron tick); each invocation is a
//! single attempt over an explicitly fetched batch of candidates. Bulk
//! persistence failures propagate to the caller's retry policy.

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::store::EmiStore;
use crate::types::InstallmentId;

/// Transition every installment with `due_date < today` that is still
/// `Pending` or `PartialPaid` to `Overdue`. Returns the number of rows
/// transitioned; already-overdue rows are excluded from selection, so a
/// second run on the same day returns zero.
pub fn sweep(
    store: &dyn EmiStore,
    today: NaiveDate,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<usize> {
    let candidates: Vec<_> = store
        .all_installments()?
        .into_iter()
        .filter(|i| i.due_date < today && i.status.is_sweepable())
        .collect();

    let ids: Vec<InstallmentId> = candidates.iter().map(|i| i.id).collect();
    let transitioned = store.mark_overdue(&ids, now)?;
    let count = transitioned.len();

    // a candidate may settle between selection and the bulk update; only
    // rows the store actually transitioned get an event
    for installment in candidates.iter().filter(|i| transitioned.contains(&i.id)) {
        events.emit(Event::InstallmentOverdue {
            installment_id: installment.id,
            loan_id: installment.loan_id,
            emi_number: installment.emi_number,
            due_date: installment.due_date,
        });
    }

    if count > 0 {
        log::info!("overdue sweep transitioned {count} installments");
    } else {
        log::debug!("overdue sweep found nothing to transition");
    }

    Ok(count)
}

/// Emit a due-soon reminder for every unpaid installment due within
/// `[today, today + days_ahead]`. Returns the number of reminders emitted.
pub fn remind_upcoming(
    store: &dyn EmiStore,
    today: NaiveDate,
    days_ahead: u32,
    events: &mut EventStore,
) -> Result<usize> {
    let horizon = today + chrono::Duration::days(days_ahead as i64);
    let mut count = 0;

    for installment in store.all_installments()? {
        if installment.status.is_unpaid()
            && installment.due_date >= today
            && installment.due_date <= horizon
        {
            events.emit(Event::InstallmentDueSoon {
                installment_id: installment.id,
                loan_id: installment.loan_id,
                customer_id: installment.customer_id,
                emi_amount: installment.emi_amount,
                due_date: installment.due_date,
            });
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::schedule;
    use crate::store::MemoryStore;
    use crate::types::EmiStatus;
    use uuid::Uuid;

    fn seed(start: NaiveDate) -> MemoryStore {
        let store = MemoryStore::new();
        let schedule = schedule::generate(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(100_000),
            Rate::from_percentage(12),
            12,
            start,
            Utc::now(),
        )
        .unwrap();
        store.insert_schedule(schedule).unwrap();
        store
    }

    #[test]
    fn test_sweep_transitions_past_due_rows() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let store = seed(start);
        // jan, feb and mar installments are past due on apr 1; the apr 1
        // installment is due today and stays untouched
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();

        let mut events = EventStore::new();
        let count = sweep(&store, today, Utc::now(), &mut events).unwrap();
        assert_eq!(count, 3);
        assert_eq!(events.events().len(), 3);

        let overdue = store
            .all_installments()
            .unwrap()
            .into_iter()
            .filter(|i| i.status == EmiStatus::Overdue)
            .count();
        assert_eq!(overdue, 3);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let store = seed(start);
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();

        let mut events = EventStore::new();
        assert_eq!(sweep(&store, today, Utc::now(), &mut events).unwrap(), 3);
        events.clear();
        assert_eq!(sweep(&store, today, Utc::now(), &mut events).unwrap(), 0);
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_due_today_is_not_swept() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let store = seed(start);

        let mut events = EventStore::new();
        assert_eq!(sweep(&store, start, Utc::now(), &mut events).unwrap(), 0);
    }

    #[test]
    fn test_partial_paid_rows_are_swept() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let store = seed(start);
        let first = store
            .all_installments()
            .unwrap()
            .into_iter()
            .find(|i| i.emi_number == 1)
            .unwrap();
        store
            .update_status(first.id, EmiStatus::PartialPaid, Utc::now())
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let mut events = EventStore::new();
        assert_eq!(sweep(&store, today, Utc::now(), &mut events).unwrap(), 1);
    }

    /// Store that settles one row between the sweep's selection and its
    /// bulk update, mimicking a payment racing the sweep.
    struct RacingStore {
        inner: MemoryStore,
        settles: InstallmentId,
    }

    impl EmiStore for RacingStore {
        fn insert_schedule(&self, installments: Vec<crate::types::Installment>) -> crate::errors::Result<()> {
            self.inner.insert_schedule(installments)
        }

        fn installment(&self, id: InstallmentId) -> crate::errors::Result<Option<crate::types::Installment>> {
            self.inner.installment(id)
        }

        fn installments_for_loan(&self, loan_id: crate::types::LoanId) -> crate::errors::Result<Vec<crate::types::Installment>> {
            self.inner.installments_for_loan(loan_id)
        }

        fn installments_for_customer(&self, customer_id: crate::types::CustomerId) -> crate::errors::Result<Vec<crate::types::Installment>> {
            self.inner.installments_for_customer(customer_id)
        }

        fn all_installments(&self) -> crate::errors::Result<Vec<crate::types::Installment>> {
            self.inner.all_installments()
        }

        fn update_status(&self, id: InstallmentId, status: EmiStatus, now: DateTime<Utc>) -> crate::errors::Result<()> {
            self.inner.update_status(id, status, now)
        }

        fn mark_overdue(&self, ids: &[InstallmentId], now: DateTime<Utc>) -> crate::errors::Result<Vec<InstallmentId>> {
            self.inner.update_status(self.settles, EmiStatus::Paid, now)?;
            self.inner.mark_overdue(ids, now)
        }

        fn insert_payment(&self, payment: crate::types::Payment) -> crate::errors::Result<()> {
            self.inner.insert_payment(payment)
        }

        fn payment(&self, id: crate::types::PaymentId) -> crate::errors::Result<Option<crate::types::Payment>> {
            self.inner.payment(id)
        }

        fn payment_by_reference(&self, reference: &str) -> crate::errors::Result<Option<crate::types::Payment>> {
            self.inner.payment_by_reference(reference)
        }

        fn payments_for_loan(&self, loan_id: crate::types::LoanId) -> crate::errors::Result<Vec<crate::types::Payment>> {
            self.inner.payments_for_loan(loan_id)
        }

        fn payments_between(&self, from: NaiveDate, to: NaiveDate) -> crate::errors::Result<Vec<crate::types::Payment>> {
            self.inner.payments_between(from, to)
        }
    }

    #[test]
    fn test_no_event_for_row_settled_during_sweep() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let inner = seed(start);
        let settles = inner
            .all_installments()
            .unwrap()
            .into_iter()
            .find(|i| i.emi_number == 2)
            .unwrap()
            .id;
        let store = RacingStore { inner, settles };

        // jan, feb, mar are candidates on apr 1, but feb settles mid-sweep
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let mut events = EventStore::new();
        let count = sweep(&store, today, Utc::now(), &mut events).unwrap();
        assert_eq!(count, 2);
        assert_eq!(events.events().len(), 2);
        assert!(events.events().iter().all(|e| {
            !matches!(e, Event::InstallmentOverdue { installment_id, .. } if *installment_id == settles)
        }));
    }

    #[test]
    fn test_remind_upcoming_window() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let store = seed(start);

        // window [jan 5, jan 12] catches only the first installment
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut events = EventStore::new();
        let count = remind_upcoming(&store, today, 7, &mut events).unwrap();
        assert_eq!(count, 1);
        assert!(matches!(
            events.events()[0],
            Event::InstallmentDueSoon { .. }
        ));
    }
}
