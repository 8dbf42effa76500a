//! Pure amortization math: EMI amount, total interest, total payable.
//!
//! Uses the monthly reducing-balance formula. All intermediate arithmetic
//! stays in full `Decimal` precision; only final results round to 2 places.

use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::errors::{EmiError, Result};

/// Calculate the equated monthly installment for a loan.
///
/// EMI = P * r * (1 + r)^n / ((1 + r)^n - 1), where r is the monthly
/// rate and n the tenure in months. Result rounded half-up to 2 places.
pub fn calculate_emi(principal: Money, annual_rate: Rate, tenure_months: u32) -> Result<Money> {
    if !principal.is_positive() {
        return Err(EmiError::InvalidInput {
            message: format!("principal must be greater than zero, got {principal}"),
        });
    }
    if !annual_rate.is_positive() {
        return Err(EmiError::InvalidInput {
            message: format!("interest rate must be greater than zero, got {annual_rate}"),
        });
    }
    if tenure_months == 0 {
        return Err(EmiError::InvalidInput {
            message: "tenure must be greater than zero".to_string(),
        });
    }

    let r = annual_rate.monthly_rate().as_decimal();

    // (1 + r)^n
    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..tenure_months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;

    Ok(Money::from_decimal(numerator / denominator))
}

/// Total interest paid over the life of the loan: emi * tenure - principal.
pub fn total_interest(emi: Money, principal: Money, tenure_months: u32) -> Money {
    Money::from_decimal(emi.as_decimal() * Decimal::from(tenure_months) - principal.as_decimal())
}

/// Total amount payable over the life of the loan: emi * tenure.
pub fn total_payable(emi: Money, tenure_months: u32) -> Money {
    Money::from_decimal(emi.as_decimal() * Decimal::from(tenure_months))
}
