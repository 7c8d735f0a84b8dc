//! Payment error types.

use common::Money;
use domain::DomainError;
use thiserror::Error;

/// Failures talking to the payment provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Client id or secret is not configured.
    #[error("Payment provider credentials are not configured")]
    MissingCredentials,

    /// The provider did not answer within the configured timeout.
    #[error("Payment provider timed out")]
    Timeout,

    /// The request never produced a response.
    #[error("Payment provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Payment provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered with a body we could not understand.
    #[error("Malformed payment provider response: {0}")]
    Malformed(String),

    /// The intent is in a state that cannot be treated as paid.
    #[error("Payment intent {intent_id} is {status}")]
    NotPayable { intent_id: String, status: String },

    /// The provider captured a different amount than the order total.
    #[error("Captured amount {captured} does not match order total {expected}")]
    AmountMismatch { expected: Money, captured: Money },

    /// The intent id is unknown to the provider.
    #[error("Payment intent not found: {0}")]
    UnknownIntent(String),
}

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// An order or authorization rule failed.
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// The provider call failed.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// The requested intent amount is not positive.
    #[error("Valid amount is required")]
    InvalidAmount { amount: i64 },

    /// No provider intent id was supplied.
    #[error("PayPal order id is required")]
    MissingIntentId,

    /// The provider intent id contains characters a provider id never has.
    #[error("Valid PayPal order id is required")]
    InvalidIntentId,

    /// No local order id was supplied, or it is malformed.
    #[error("Valid local order id is required")]
    InvalidOrderId,
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
