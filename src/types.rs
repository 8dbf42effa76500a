use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;
/// unique identifier for a customer
pub type CustomerId = Uuid;
/// unique identifier for an installment
pub type InstallmentId = Uuid;
/// unique identifier for a payment record
pub type PaymentId = Uuid;
/// unique identifier for an acting user
pub type UserId = Uuid;

/// payment status of a single EMI installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmiStatus {
    /// due in the future, nothing received yet
    Pending,
    /// a payment below the full EMI amount was received
    PartialPaid,
    /// settled by a single payment covering the full EMI amount
    Paid,
    /// due date passed while still unpaid
    Overdue,
}

/// events that drive installment status transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmiEvent {
    /// a single payment covering the full EMI amount
    FullPayment,
    /// a payment below the full EMI amount
    PartialPayment,
    /// the due date passed without full settlement
    DueDatePassed,
}

impl EmiStatus {
    /// Pure transition function; both the payment recorder and the overdue
    /// sweeper route through this so the rules live in one place.
    ///
    /// `Paid` is terminal. `DueDatePassed` only reclassifies installments
    /// that are still collectible, which makes the sweep idempotent.
    pub fn transition(self, event: EmiEvent) -> EmiStatus {
        match (self, event) {
            (EmiStatus::Paid, _) => EmiStatus::Paid,
            (_, EmiEvent::FullPayment) => EmiStatus::Paid,
            (_, EmiEvent::PartialPayment) => EmiStatus::PartialPaid,
            (EmiStatus::Pending, EmiEvent::DueDatePassed) => EmiStatus::Overdue,
            (EmiStatus::PartialPaid, EmiEvent::DueDatePassed) => EmiStatus::Overdue,
            (EmiStatus::Overdue, EmiEvent::DueDatePassed) => EmiStatus::Overdue,
        }
    }

    /// installment still owes money
    pub fn is_unpaid(&self) -> bool {
        matches!(self, EmiStatus::Pending | EmiStatus::PartialPaid | EmiStatus::Overdue)
    }

    /// eligible for the overdue sweep (excludes rows already swept)
    pub fn is_sweepable(&self) -> bool {
        matches!(self, EmiStatus::Pending | EmiStatus::PartialPaid)
    }
}

/// payment methods accepted against an installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Cheque,
    Neft,
    Rtgs,
    Upi,
    DebitCard,
    CreditCard,
    NetBanking,
    DemandDraft,
}

impl PaymentMethod {
    /// every method except cash must carry a transaction reference
    pub fn requires_reference(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

/// One EMI installment of a loan's amortization schedule.
///
/// Created in bulk exactly once per loan; only `status` and `updated_at`
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    /// 1-based sequence index, unique per loan
    pub emi_number: u32,
    pub due_date: NaiveDate,
    pub emi_amount: Money,
    pub principal_component: Money,
    pub interest_component: Money,
    /// principal remaining after this installment is notionally paid
    pub outstanding_balance: Money,
    pub status: EmiStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Installment {
    /// True when the installment should count as overdue right now,
    /// regardless of whether the sweep has persisted the status yet.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == EmiStatus::Overdue
            || (self.status.is_sweepable() && self.due_date < today)
    }
}

/// An immutable payment record against one installment.
///
/// Append-only; an installment may accumulate several partial payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub installment_id: InstallmentId,
    pub loan_id: LoanId,
    pub amount: Money,
    pub late_fee: Money,
    /// amount + late fee
    pub total_paid: Money,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub transaction_reference: Option<String>,
    pub paid_by: UserId,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}
