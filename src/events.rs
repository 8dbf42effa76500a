use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{CustomerId, InstallmentId, LoanId, PaymentId};

/// all events emitted by the engine for downstream delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ScheduleGenerated {
        loan_id: LoanId,
        customer_id: CustomerId,
        installment_count: u32,
        total_payable: Money,
        first_due_date: NaiveDate,
    },
    PaymentRecorded {
        payment_id: PaymentId,
        installment_id: InstallmentId,
        loan_id: LoanId,
        emi_number: u32,
        amount: Money,
        late_fee: Money,
        payment_date: NaiveDate,
    },
    LateFeeAssessed {
        installment_id: InstallmentId,
        loan_id: LoanId,
        fee: Money,
        chargeable_days: u32,
    },
    InstallmentOverdue {
        installment_id: InstallmentId,
        loan_id: LoanId,
        emi_number: u32,
        due_date: NaiveDate,
    },
    InstallmentDueSoon {
        installment_id: InstallmentId,
        loan_id: LoanId,
        customer_id: CustomerId,
        emi_amount: Money,
        due_date: NaiveDate,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
