//! Grace-period and per-day-percentage late fee computation.
//!
//! Pure and stateless. Fee = emi_amount * percent_per_day * chargeable_days / 100,
//! where chargeable days exclude the grace period.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::decimal::Money;

/// True only when the payment landed strictly after the grace window.
/// Payments on the due date, or anywhere in `[due, due + grace]`, are not late.
pub fn is_late(due_date: NaiveDate, payment_date: NaiveDate, grace_days: u32) -> bool {
    if payment_date <= due_date {
        return false;
    }
    let grace_end = due_date + chrono::Duration::days(grace_days as i64);
    payment_date > grace_end
}

/// Days that actually attract a fee: total days late minus the grace period,
/// floored at zero.
pub fn chargeable_late_days(due_date: NaiveDate, payment_date: NaiveDate, grace_days: u32) -> u32 {
    if payment_date <= due_date {
        return 0;
    }
    let total_late = (payment_date - due_date).num_days();
    (total_late - grace_days as i64).max(0) as u32
}

/// Late fee for a payment against an installment. Zero when the per-day
/// percentage is not positive or the payment is within the grace window.
pub fn calculate_late_fee(
    emi_amount: Money,
    due_date: NaiveDate,
    payment_date: NaiveDate,
    percent_per_day: Decimal,
    grace_days: u32,
) -> Money {
    if percent_per_day <= Decimal::ZERO {
        return Money::ZERO;
    }
    if !is_late(due_date, payment_date, grace_days) {
        return Money::ZERO;
    }

    let days = chargeable_late_days(due_date, payment_date, grace_days);
    if days == 0 {
        return Money::ZERO;
    }

    Money::from_decimal(
        emi_amount.as_decimal() * percent_per_day * Decimal::from(days) / Decimal::from(100),
    )
}
