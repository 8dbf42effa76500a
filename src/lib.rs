pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod payments;
pub mod ports;
pub mod schedule;
pub mod store;
pub mod summary;
pub mod sweep;
pub mod types;

// re-export key types
pub use config::EngineConfig;
pub use decimal::{Money, Rate};
pub use engine::{DisbursementEvent, EmiEngine, PaymentReceipt};
pub use errors::{EmiError, Result};
pub use events::{Event, EventStore};
pub use payments::{PaymentOutcome, PaymentRequest};
pub use ports::{IdentityLookup, NoIdentity, NoNotifications, NotificationSink};
pub use store::{EmiStore, MemoryStore};
pub use summary::{CustomerEmiSummary, LoanSummary, OverdueStats, PaymentStats};
pub use types::{
    CustomerId, EmiEvent, EmiStatus, Installment, InstallmentId, LoanId, Payment,
    PaymentId, PaymentMethod, UserId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
