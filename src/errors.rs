use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::PaymentMethod;

#[derive(Error, Debug)]
pub enum EmiError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("schedule already exists for loan {loan_id}")]
    AlreadyExists {
        loan_id: Uuid,
    },

    #[error("installment already paid: {installment_id}")]
    AlreadyPaid {
        installment_id: Uuid,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("transaction reference required for payment method {method:?}")]
    ReferenceRequired {
        method: PaymentMethod,
    },

    #[error("duplicate transaction reference: {reference}")]
    DuplicateReference {
        reference: String,
    },

    #[error("store failure: {message}")]
    StoreFailure {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, EmiError>;
