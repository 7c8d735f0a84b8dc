//! Payment provider trait.

use std::sync::Arc;

use async_trait::async_trait;
use common::Money;

use crate::error::ProviderError;

/// Status string the provider reports for a captured intent.
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// Status string the provider reports once the buyer has approved.
pub const STATUS_APPROVED: &str = "APPROVED";

/// True if `intent_id` looks like a provider order id: ASCII letters,
/// digits and `-` only. Ids are pasted into request paths.
pub fn is_valid_intent_id(intent_id: &str) -> bool {
    !intent_id.is_empty()
        && intent_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// A freshly created payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
}

/// What the provider knows about an existing intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentDetails {
    pub id: String,
    pub status: String,
    pub payer_email: Option<String>,
    /// Amount of the first purchase unit, when reported.
    pub amount: Option<Money>,
}

impl IntentDetails {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn is_approved(&self) -> bool {
        self.status == STATUS_APPROVED
    }
}

/// Operations against an external payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a capture-intent for `amount` in USD.
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, ProviderError>;

    /// Looks up an existing intent.
    async fn get_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError>;

    /// Captures an approved intent.
    async fn capture_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError>;
}

#[async_trait]
impl<P: PaymentProvider + ?Sized> PaymentProvider for Arc<P> {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, ProviderError> {
        (**self).create_intent(amount).await
    }

    async fn get_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError> {
        (**self).get_intent(intent_id).await
    }

    async fn capture_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError> {
        (**self).capture_intent(intent_id).await
    }
}
