//! Read-side rollups for reporting and dashboards.
//!
//! Every operation here is read-only and works over an owned snapshot of
//! the store, so it tolerates concurrent writes (slightly stale counts are
//! acceptable). Lateness is recomputed from due dates on the read path:
//! an unpaid installment whose date has passed counts as overdue even if
//! the sweeper has not persisted the status yet.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{EmiError, Result};
use crate::store::EmiStore;
use crate::types::{
    CustomerId, EmiStatus, Installment, LoanId, Payment, PaymentId,
};

/// per-loan dashboard rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    pub total_emis: u32,
    pub paid_emis: u32,
    pub pending_emis: u32,
    pub overdue_emis: u32,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub pending_amount: Money,
    pub outstanding_amount: Money,
}

/// overall overdue picture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverdueStats {
    pub overdue_count: u32,
    pub overdue_amount: Money,
}

/// next unpaid installment for a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextDue {
    pub loan_id: LoanId,
    pub emi_number: u32,
    pub emi_amount: Money,
    pub due_date: NaiveDate,
}

/// per-customer dashboard rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerEmiSummary {
    pub customer_id: CustomerId,
    pub total_pending: Money,
    pub overdue_count: u32,
    pub next_due: Option<NextDue>,
}

/// payment volume over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStats {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub payment_count: u32,
    pub total_amount: Money,
}

/// Full rollup for one loan. `NotFound` if the loan has no schedule.
pub fn per_loan_summary(
    store: &dyn EmiStore,
    loan_id: LoanId,
    today: NaiveDate,
) -> Result<LoanSummary> {
    let schedule = store.installments_for_loan(loan_id)?;
    if schedule.is_empty() {
        return Err(EmiError::NotFound {
            entity: "schedule",
            id: loan_id,
        });
    }

    let mut paid = 0u32;
    let mut pending = 0u32;
    let mut overdue = 0u32;
    let mut total_amount = Money::ZERO;
    let mut paid_amount = Money::ZERO;

    for installment in &schedule {
        total_amount += installment.emi_amount;
        match installment.status {
            EmiStatus::Paid => {
                paid += 1;
                paid_amount += installment.emi_amount;
            }
            EmiStatus::Overdue => overdue += 1,
            EmiStatus::Pending | EmiStatus::PartialPaid => {
                if installment.is_past_due(today) {
                    overdue += 1;
                } else {
                    pending += 1;
                }
            }
        }
    }

    Ok(LoanSummary {
        loan_id,
        customer_id: schedule[0].customer_id,
        total_emis: schedule.len() as u32,
        paid_emis: paid,
        pending_emis: pending,
        overdue_emis: overdue,
        total_amount,
        paid_amount,
        pending_amount: total_amount - paid_amount,
        outstanding_amount: outstanding_of(&schedule),
    })
}

/// Amount still owed on a loan: the full EMI amounts of every installment
/// not yet fully paid. Partially paid rows count at their full EMI amount.
/// Zero for an unknown loan.
pub fn outstanding_amount(store: &dyn EmiStore, loan_id: LoanId) -> Result<Money> {
    Ok(outstanding_of(&store.installments_for_loan(loan_id)?))
}

fn outstanding_of(schedule: &[Installment]) -> Money {
    schedule
        .iter()
        .filter(|i| i.status != EmiStatus::Paid)
        .map(|i| i.emi_amount)
        .sum()
}

/// Sum of EMI amounts across all fully paid installments.
pub fn total_collected(store: &dyn EmiStore) -> Result<Money> {
    Ok(store
        .all_installments()?
        .iter()
        .filter(|i| i.status == EmiStatus::Paid)
        .map(|i| i.emi_amount)
        .sum())
}

/// Sum of EMI amounts across everything still unpaid
/// (`Pending + PartialPaid + Overdue`).
pub fn total_pending(store: &dyn EmiStore) -> Result<Money> {
    Ok(store
        .all_installments()?
        .iter()
        .filter(|i| i.status.is_unpaid())
        .map(|i| i.emi_amount)
        .sum())
}

/// Overdue count and amount, computed from actual due-date comparison
/// rather than persisted status.
pub fn overdue_statistics(store: &dyn EmiStore, today: NaiveDate) -> Result<OverdueStats> {
    let mut count = 0u32;
    let mut amount = Money::ZERO;
    for installment in store.all_installments()? {
        if installment.is_past_due(today) {
            count += 1;
            amount += installment.emi_amount;
        }
    }
    Ok(OverdueStats {
        overdue_count: count,
        overdue_amount: amount,
    })
}

/// Per-customer rollup: total still owed, overdue count, and the single
/// next unpaid installment by due date. Zeroed for unknown customers.
pub fn customer_emi_summary(
    store: &dyn EmiStore,
    customer_id: CustomerId,
    today: NaiveDate,
) -> Result<CustomerEmiSummary> {
    let schedules = store.installments_for_customer(customer_id)?;

    let total_pending = schedules
        .iter()
        .filter(|i| i.status != EmiStatus::Paid)
        .map(|i| i.emi_amount)
        .sum();

    let overdue_count = schedules.iter().filter(|i| i.is_past_due(today)).count() as u32;

    // schedules arrive due-date ascending, so the first unpaid row wins
    let next_due = schedules
        .iter()
        .find(|i| i.status.is_unpaid())
        .map(|i| NextDue {
            loan_id: i.loan_id,
            emi_number: i.emi_number,
            emi_amount: i.emi_amount,
            due_date: i.due_date,
        });

    Ok(CustomerEmiSummary {
        customer_id,
        total_pending,
        overdue_count,
        next_due,
    })
}

/// Installments of any status due within `[today, today + days_ahead]`,
/// ordered by due date.
pub fn upcoming_emis(
    store: &dyn EmiStore,
    today: NaiveDate,
    days_ahead: u32,
) -> Result<Vec<Installment>> {
    let horizon = today + chrono::Duration::days(days_ahead as i64);
    let mut rows: Vec<Installment> = store
        .all_installments()?
        .into_iter()
        .filter(|i| i.due_date >= today && i.due_date <= horizon)
        .collect();
    rows.sort_by_key(|i| (i.due_date, i.emi_number));
    Ok(rows)
}

/// Ordered schedule for a loan; `NotFound` if none was generated.
pub fn schedule_for_loan(store: &dyn EmiStore, loan_id: LoanId) -> Result<Vec<Installment>> {
    let schedule = store.installments_for_loan(loan_id)?;
    if schedule.is_empty() {
        return Err(EmiError::NotFound {
            entity: "schedule",
            id: loan_id,
        });
    }
    Ok(schedule)
}

/// All installments of a customer across loans, due-date ascending.
/// Empty result for unknown customers.
pub fn schedules_for_customer(
    store: &dyn EmiStore,
    customer_id: CustomerId,
) -> Result<Vec<Installment>> {
    store.installments_for_customer(customer_id)
}

/// A customer's installments still awaiting their first payment.
pub fn pending_for_customer(
    store: &dyn EmiStore,
    customer_id: CustomerId,
) -> Result<Vec<Installment>> {
    Ok(store
        .installments_for_customer(customer_id)?
        .into_iter()
        .filter(|i| i.status == EmiStatus::Pending)
        .collect())
}

/// Everything past due as of `today`, by actual date comparison.
pub fn overdue_installments(store: &dyn EmiStore, today: NaiveDate) -> Result<Vec<Installment>> {
    let mut rows: Vec<Installment> = store
        .all_installments()?
        .into_iter()
        .filter(|i| i.is_past_due(today))
        .collect();
    rows.sort_by_key(|i| (i.due_date, i.emi_number));
    Ok(rows)
}

/// A customer's past-due installments as of `today`.
pub fn overdue_for_customer(
    store: &dyn EmiStore,
    customer_id: CustomerId,
    today: NaiveDate,
) -> Result<Vec<Installment>> {
    Ok(store
        .installments_for_customer(customer_id)?
        .into_iter()
        .filter(|i| i.is_past_due(today))
        .collect())
}

/// True when every installment of the loan is fully paid.
pub fn all_emis_paid(store: &dyn EmiStore, loan_id: LoanId) -> Result<bool> {
    let schedule = store.installments_for_loan(loan_id)?;
    Ok(!schedule.is_empty() && schedule.iter().all(|i| i.status == EmiStatus::Paid))
}

/// Payment records for a loan, newest first.
pub fn payment_history(store: &dyn EmiStore, loan_id: LoanId) -> Result<Vec<Payment>> {
    store.payments_for_loan(loan_id)
}

/// Single payment lookup by id.
pub fn payment_by_id(store: &dyn EmiStore, payment_id: PaymentId) -> Result<Payment> {
    store.payment(payment_id)?.ok_or(EmiError::NotFound {
        entity: "payment",
        id: payment_id,
    })
}

/// Single payment lookup by transaction reference.
pub fn payment_by_reference(store: &dyn EmiStore, reference: &str) -> Result<Option<Payment>> {
    store.payment_by_reference(reference)
}

/// Payment count and volume within `[from, to]` inclusive.
pub fn payment_statistics(
    store: &dyn EmiStore,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<PaymentStats> {
    let payments = store.payments_between(from, to)?;
    let total_amount = payments.iter().map(|p| p.amount).sum();
    Ok(PaymentStats {
        from,
        to,
        payment_count: payments.len() as u32,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::schedule;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed(
        store: &MemoryStore,
        customer_id: CustomerId,
        start: NaiveDate,
        tenure: u32,
    ) -> (LoanId, Vec<Installment>) {
        let loan_id = Uuid::new_v4();
        let rows = schedule::generate(
            loan_id,
            customer_id,
            Money::from_major(100_000),
            Rate::from_percentage(12),
            tenure,
            start,
            Utc::now(),
        )
        .unwrap();
        store.insert_schedule(rows.clone()).unwrap();
        (loan_id, rows)
    }

    #[test]
    fn test_summary_counts_stale_pending_as_overdue() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let (loan_id, rows) = seed(&store, customer, date(2026, 1, 1), 2);

        // first installment paid, second still Pending but past due
        store
            .update_status(rows[0].id, EmiStatus::Paid, Utc::now())
            .unwrap();

        let today = date(2026, 3, 15);
        let summary = per_loan_summary(&store, loan_id, today).unwrap();
        assert_eq!(summary.total_emis, 2);
        assert_eq!(summary.paid_emis, 1);
        assert_eq!(summary.pending_emis, 0);
        assert_eq!(summary.overdue_emis, 1);
        assert_eq!(
            summary.pending_amount,
            summary.total_amount - summary.paid_amount
        );
    }

    #[test]
    fn test_summary_not_found_for_unknown_loan() {
        let store = MemoryStore::new();
        let err = per_loan_summary(&store, Uuid::new_v4(), date(2026, 1, 1)).unwrap_err();
        assert!(matches!(err, EmiError::NotFound { entity: "schedule", .. }));
    }

    #[test]
    fn test_outstanding_shrinks_as_installments_settle() {
        let store = MemoryStore::new();
        let (loan_id, rows) = seed(&store, Uuid::new_v4(), date(2026, 1, 1), 12);

        let before = outstanding_amount(&store, loan_id).unwrap();
        let book: Money = rows.iter().map(|i| i.emi_amount).sum();
        assert_eq!(before, book);

        store
            .update_status(rows[0].id, EmiStatus::Paid, Utc::now())
            .unwrap();
        let after = outstanding_amount(&store, loan_id).unwrap();
        assert_eq!(after, before - rows[0].emi_amount);
        // 100000 at 12% over 12 months, one EMI of 8884.88 settled
        assert_eq!(after, Money::from_str_exact("97733.65").unwrap());
    }

    #[test]
    fn test_outstanding_counts_partial_rows_at_full_emi() {
        let store = MemoryStore::new();
        let (loan_id, rows) = seed(&store, Uuid::new_v4(), date(2026, 1, 1), 12);

        let before = outstanding_amount(&store, loan_id).unwrap();
        store
            .update_status(rows[0].id, EmiStatus::PartialPaid, Utc::now())
            .unwrap();
        // a partial payment does not reduce what is owed on the row
        assert_eq!(outstanding_amount(&store, loan_id).unwrap(), before);
    }

    #[test]
    fn test_collected_and_pending_split_the_book() {
        let store = MemoryStore::new();
        let (_, rows) = seed(&store, Uuid::new_v4(), date(2026, 1, 1), 12);

        store
            .update_status(rows[0].id, EmiStatus::Paid, Utc::now())
            .unwrap();
        store
            .update_status(rows[1].id, EmiStatus::Overdue, Utc::now())
            .unwrap();

        let collected = total_collected(&store).unwrap();
        let pending = total_pending(&store).unwrap();
        assert_eq!(collected, rows[0].emi_amount);

        let book: Money = rows.iter().map(|i| i.emi_amount).sum();
        assert_eq!(collected + pending, book);
    }

    #[test]
    fn test_overdue_statistics_use_dates_not_status() {
        let store = MemoryStore::new();
        seed(&store, Uuid::new_v4(), date(2026, 1, 1), 3);

        // nothing swept yet; feb 2 means the january installment is late
        let stats = overdue_statistics(&store, date(2026, 2, 2)).unwrap();
        assert_eq!(stats.overdue_count, 1);
        assert!(stats.overdue_amount.is_positive());

        let none = overdue_statistics(&store, date(2026, 1, 1)).unwrap();
        assert_eq!(none.overdue_count, 0);
        assert_eq!(none.overdue_amount, Money::ZERO);
    }

    #[test]
    fn test_customer_summary_next_due_ordering() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        // two loans, the second one starting earlier
        seed(&store, customer, date(2026, 3, 1), 6);
        let (early_loan, _) = seed(&store, customer, date(2026, 2, 1), 6);

        let summary = customer_emi_summary(&store, customer, date(2026, 1, 15)).unwrap();
        let next = summary.next_due.unwrap();
        assert_eq!(next.loan_id, early_loan);
        assert_eq!(next.due_date, date(2026, 2, 1));
        assert_eq!(summary.overdue_count, 0);
        assert!(summary.total_pending.is_positive());
    }

    #[test]
    fn test_customer_summary_zeroed_when_empty() {
        let store = MemoryStore::new();
        let summary = customer_emi_summary(&store, Uuid::new_v4(), date(2026, 1, 1)).unwrap();
        assert_eq!(summary.total_pending, Money::ZERO);
        assert_eq!(summary.overdue_count, 0);
        assert!(summary.next_due.is_none());
    }

    #[test]
    fn test_upcoming_window_any_status() {
        let store = MemoryStore::new();
        let (_, rows) = seed(&store, Uuid::new_v4(), date(2026, 1, 10), 12);
        store
            .update_status(rows[0].id, EmiStatus::Paid, Utc::now())
            .unwrap();

        // paid installments still show in the upcoming window
        let upcoming = upcoming_emis(&store, date(2026, 1, 5), 7).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].status, EmiStatus::Paid);

        let wider = upcoming_emis(&store, date(2026, 1, 5), 40).unwrap();
        assert_eq!(wider.len(), 2);
    }

    #[test]
    fn test_all_emis_paid() {
        let store = MemoryStore::new();
        let (loan_id, rows) = seed(&store, Uuid::new_v4(), date(2026, 1, 1), 2);

        assert!(!all_emis_paid(&store, loan_id).unwrap());
        for row in &rows {
            store
                .update_status(row.id, EmiStatus::Paid, Utc::now())
                .unwrap();
        }
        assert!(all_emis_paid(&store, loan_id).unwrap());
        // an unknown loan is not "all paid"
        assert!(!all_emis_paid(&store, Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_payment_statistics_range() {
        use crate::types::{Payment, PaymentMethod};

        let store = MemoryStore::new();
        let (loan_id, rows) = seed(&store, Uuid::new_v4(), date(2026, 1, 1), 3);

        for (idx, row) in rows.iter().enumerate().take(2) {
            store
                .insert_payment(Payment {
                    id: Uuid::new_v4(),
                    installment_id: row.id,
                    loan_id,
                    amount: Money::from_major(1000),
                    late_fee: Money::ZERO,
                    total_paid: Money::from_major(1000),
                    payment_date: date(2026, 1, 10 + idx as u32),
                    method: PaymentMethod::Cash,
                    transaction_reference: None,
                    paid_by: Uuid::new_v4(),
                    remarks: None,
                    created_at: Utc::now(),
                })
                .unwrap();
        }

        let stats = payment_statistics(&store, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        assert_eq!(stats.payment_count, 2);
        assert_eq!(stats.total_amount, Money::from_major(2000));

        let narrow = payment_statistics(&store, date(2026, 1, 11), date(2026, 1, 11)).unwrap();
        assert_eq!(narrow.payment_count, 1);
    }
}
