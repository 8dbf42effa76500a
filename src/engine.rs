//! Engine facade: wires the store, outbound ports, policy config and a
//! time provider behind the inbound contracts (disbursement trigger,
//! payment intake, sweep tick, reporting queries).

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::payments::{self, PaymentRequest};
use crate::ports::{fallback_label, IdentityLookup, NotificationSink};
use crate::schedule;
use crate::store::EmiStore;
use crate::summary::{
    self, CustomerEmiSummary, LoanSummary, OverdueStats, PaymentStats,
};
use crate::sweep;
use crate::types::{
    CustomerId, Installment, LoanId, Payment, PaymentId, UserId,
};

/// inbound "loan disbursed" trigger
#[derive(Debug, Clone, PartialEq)]
pub struct DisbursementEvent {
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    pub principal: Money,
    /// annual rate in percent, e.g. 12.5 for 12.5%
    pub annual_rate_percent: Decimal,
    pub tenure_months: u32,
    pub start_date: NaiveDate,
}

/// payment response enriched with the payer's display name (best-effort)
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub emi_number: u32,
    pub paid_by_name: String,
}

/// The EMI engine. One instance serves a shared store; mutating entry
/// points are per-request, the sweep is per-timer-tick.
pub struct EmiEngine<S: EmiStore> {
    store: S,
    identity: Box<dyn IdentityLookup>,
    notifier: Box<dyn NotificationSink>,
    config: EngineConfig,
    time: SafeTimeProvider,
}

impl<S: EmiStore> EmiEngine<S> {
    pub fn new(
        store: S,
        identity: Box<dyn IdentityLookup>,
        notifier: Box<dyn NotificationSink>,
        config: EngineConfig,
        time: SafeTimeProvider,
    ) -> Self {
        Self {
            store,
            identity,
            notifier,
            config,
            time,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.time.now().date_naive()
    }

    /// fire-and-forget event delivery; never fails the primary operation
    fn dispatch(&self, mut events: EventStore) {
        for event in events.take_events() {
            self.notifier.deliver(&event);
        }
    }

    /// Generate and persist the amortization schedule for a disbursed
    /// loan. Write-once per loan: a second call fails with `AlreadyExists`.
    pub fn generate_schedule(&self, event: DisbursementEvent) -> Result<Vec<Installment>> {
        log::info!(
            "generating schedule for loan {} ({} months)",
            event.loan_id,
            event.tenure_months
        );

        let installments = schedule::generate(
            event.loan_id,
            event.customer_id,
            event.principal,
            Rate::from_percent_decimal(event.annual_rate_percent),
            event.tenure_months,
            event.start_date,
            self.time.now(),
        )?;

        self.store.insert_schedule(installments.clone())?;

        let total_payable = installments.iter().map(|i| i.emi_amount).sum();
        let mut events_out = EventStore::new();
        events_out.emit(Event::ScheduleGenerated {
            loan_id: event.loan_id,
            customer_id: event.customer_id,
            installment_count: installments.len() as u32,
            total_payable,
            first_due_date: event.start_date,
        });
        self.dispatch(events_out);

        Ok(installments)
    }

    /// Record a payment on behalf of `acting_user` and return a receipt
    /// enriched with the payer's display name. Enrichment is best-effort:
    /// a failed identity lookup degrades to a placeholder label.
    pub fn record_payment(
        &self,
        request: PaymentRequest,
        acting_user: UserId,
    ) -> Result<PaymentReceipt> {
        let installment_id = request.installment_id;
        let mut events = EventStore::new();

        let outcome = payments::record_payment(
            &self.store,
            &self.config,
            request,
            acting_user,
            self.time.now(),
            &mut events,
        )?;

        self.dispatch(events);

        let paid_by_name = match self.identity.display_name(acting_user) {
            Some(name) => name,
            None => {
                log::warn!(
                    "identity lookup failed for {acting_user} (installment {installment_id}), using placeholder"
                );
                fallback_label(acting_user)
            }
        };

        Ok(PaymentReceipt {
            payment: outcome.payment,
            emi_number: outcome.emi_number,
            paid_by_name,
        })
    }

    /// Timer-tick entry: reclassify everything past due as of today.
    pub fn sweep(&self) -> Result<usize> {
        let mut events = EventStore::new();
        let count = sweep::sweep(&self.store, self.today(), self.time.now(), &mut events)?;
        self.dispatch(events);
        Ok(count)
    }

    /// Timer-tick entry: emit due-soon reminders for the configured window.
    pub fn remind_upcoming(&self) -> Result<usize> {
        let mut events = EventStore::new();
        let count = sweep::remind_upcoming(
            &self.store,
            self.today(),
            self.config.reminder_days_ahead,
            &mut events,
        )?;
        self.dispatch(events);
        Ok(count)
    }

    // --- reporting queries (read-only) ---

    pub fn loan_summary(&self, loan_id: LoanId) -> Result<LoanSummary> {
        summary::per_loan_summary(&self.store, loan_id, self.today())
    }

    pub fn outstanding_amount(&self, loan_id: LoanId) -> Result<Money> {
        summary::outstanding_amount(&self.store, loan_id)
    }

    pub fn total_collected(&self) -> Result<Money> {
        summary::total_collected(&self.store)
    }

    pub fn total_pending(&self) -> Result<Money> {
        summary::total_pending(&self.store)
    }

    pub fn overdue_statistics(&self) -> Result<OverdueStats> {
        summary::overdue_statistics(&self.store, self.today())
    }

    pub fn customer_summary(&self, customer_id: CustomerId) -> Result<CustomerEmiSummary> {
        summary::customer_emi_summary(&self.store, customer_id, self.today())
    }

    pub fn upcoming_emis(&self, days_ahead: u32) -> Result<Vec<Installment>> {
        summary::upcoming_emis(&self.store, self.today(), days_ahead)
    }

    pub fn schedule_for_loan(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        summary::schedule_for_loan(&self.store, loan_id)
    }

    pub fn schedules_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Installment>> {
        summary::schedules_for_customer(&self.store, customer_id)
    }

    pub fn pending_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Installment>> {
        summary::pending_for_customer(&self.store, customer_id)
    }

    pub fn overdue_installments(&self) -> Result<Vec<Installment>> {
        summary::overdue_installments(&self.store, self.today())
    }

    pub fn overdue_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Installment>> {
        summary::overdue_for_customer(&self.store, customer_id, self.today())
    }

    pub fn all_emis_paid(&self, loan_id: LoanId) -> Result<bool> {
        summary::all_emis_paid(&self.store, loan_id)
    }

    pub fn payment_history(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        summary::payment_history(&self.store, loan_id)
    }

    pub fn payment_by_id(&self, payment_id: PaymentId) -> Result<Payment> {
        summary::payment_by_id(&self.store, payment_id)
    }

    pub fn payment_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        summary::payment_by_reference(&self.store, reference)
    }

    pub fn payment_statistics(&self, from: NaiveDate, to: NaiveDate) -> Result<PaymentStats> {
        summary::payment_statistics(&self.store, from, to)
    }
}
