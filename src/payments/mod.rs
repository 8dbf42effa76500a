//! Payment recording against installments.

pub mod late_fee;

pub use late_fee::{calculate_late_fee, chargeable_late_days, is_late};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{EmiError, Result};
use crate::events::{Event, EventStore};
use crate::store::EmiStore;
use crate::types::{EmiEvent, InstallmentId, Payment, PaymentMethod, UserId};

/// inbound payment intake contract
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub installment_id: InstallmentId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub transaction_reference: Option<String>,
    pub remarks: Option<String>,
}

/// persisted payment plus the context callers need for receipts
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub emi_number: u32,
}

/// Record a payment against one installment and reclassify it.
///
/// Classification compares the single payment's amount against the
/// installment's fixed `emi_amount`, not the remaining unpaid balance:
/// two partial payments that together reach the EMI amount leave the
/// installment `PartialPaid`. The acting user is an explicit parameter.
pub fn record_payment(
    store: &dyn EmiStore,
    config: &EngineConfig,
    request: PaymentRequest,
    acting_user: UserId,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<PaymentOutcome> {
    let installment = store
        .installment(request.installment_id)?
        .ok_or(EmiError::NotFound {
            entity: "installment",
            id: request.installment_id,
        })?;

    if installment.status == crate::types::EmiStatus::Paid {
        return Err(EmiError::AlreadyPaid {
            installment_id: installment.id,
        });
    }

    if !request.amount.is_positive() {
        return Err(EmiError::InvalidAmount {
            amount: request.amount,
        });
    }

    let reference = normalize_reference(request.transaction_reference);
    if request.method.requires_reference() && reference.is_none() {
        return Err(EmiError::ReferenceRequired {
            method: request.method,
        });
    }

    // early duplicate check; the store's unique constraint is the final
    // guard against two concurrent requests passing this together
    if let Some(reference) = &reference {
        if store.payment_by_reference(reference)?.is_some() {
            return Err(EmiError::DuplicateReference {
                reference: reference.clone(),
            });
        }
    }

    let fee = late_fee::calculate_late_fee(
        installment.emi_amount,
        installment.due_date,
        request.payment_date,
        config.late_fee_percent_per_day,
        config.grace_period_days,
    );

    let payment = Payment {
        id: Uuid::new_v4(),
        installment_id: installment.id,
        loan_id: installment.loan_id,
        amount: request.amount,
        late_fee: fee,
        total_paid: request.amount + fee,
        payment_date: request.payment_date,
        method: request.method,
        transaction_reference: reference,
        paid_by: acting_user,
        remarks: request.remarks,
        created_at: now,
    };

    store.insert_payment(payment.clone())?;

    let event = if request.amount >= installment.emi_amount {
        EmiEvent::FullPayment
    } else {
        EmiEvent::PartialPayment
    };
    let new_status = installment.status.transition(event);
    store.update_status(installment.id, new_status, now)?;

    log::info!(
        "payment {} recorded: emi #{} of loan {} -> {:?}",
        payment.id,
        installment.emi_number,
        installment.loan_id,
        new_status
    );

    if fee.is_positive() {
        events.emit(Event::LateFeeAssessed {
            installment_id: installment.id,
            loan_id: installment.loan_id,
            fee,
            chargeable_days: late_fee::chargeable_late_days(
                installment.due_date,
                request.payment_date,
                config.grace_period_days,
            ),
        });
    }
    events.emit(Event::PaymentRecorded {
        payment_id: payment.id,
        installment_id: installment.id,
        loan_id: installment.loan_id,
        emi_number: installment.emi_number,
        amount: payment.amount,
        late_fee: fee,
        payment_date: payment.payment_date,
    });

    Ok(PaymentOutcome {
        payment,
        emi_number: installment.emi_number,
    })
}

fn normalize_reference(reference: Option<String>) -> Option<String> {
    reference.and_then(|r| {
        let trimmed = r.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
