//! Builds the full installment schedule for a freshly disbursed loan.

use chrono::{DateTime, Months, NaiveDate, Utc};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{EmiError, Result};
use crate::schedule::calculator;
use crate::types::{CustomerId, EmiStatus, Installment, LoanId};

/// Generate the ordered installment list for a loan.
///
/// Interest each month is charged on the remaining balance; the final
/// installment's principal is set to the full remainder so the schedule
/// lands on exactly 0.00, absorbing accumulated rounding drift.
pub fn generate(
    loan_id: LoanId,
    customer_id: CustomerId,
    principal: Money,
    annual_rate: Rate,
    tenure_months: u32,
    start_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<Installment>> {
    let mut emi = calculator::calculate_emi(principal, annual_rate, tenure_months)?;
    let monthly_rate = annual_rate.monthly_rate().as_decimal();

    let mut schedule = Vec::with_capacity(tenure_months as usize);
    let mut outstanding = principal;

    for i in 1..=tenure_months {
        let interest = Money::from_decimal(outstanding.as_decimal() * monthly_rate);
        let mut principal_component = emi - interest;

        // last installment clears the loan exactly, absorbing rounding drift
        if i == tenure_months {
            principal_component = outstanding;
            emi = principal_component + interest;
        }

        outstanding = (outstanding - principal_component).max(Money::ZERO);

        let due_date = start_date
            .checked_add_months(Months::new(i - 1))
            .ok_or_else(|| EmiError::InvalidInput {
                message: format!("due date overflow at installment {i}"),
            })?;

        schedule.push(Installment {
            id: Uuid::new_v4(),
            loan_id,
            customer_id,
            emi_number: i,
            due_date,
            emi_amount: emi,
            principal_component,
            interest_component: interest,
            outstanding_balance: outstanding,
            status: EmiStatus::Pending,
            created_at: now,
            updated_at: now,
        });
    }

    log::debug!(
        "generated {} installments for loan {loan_id}, emi {}",
        schedule.len(),
        schedule[0].emi_amount
    );

    Ok(schedule)
}
