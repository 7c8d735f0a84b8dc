//! In-memory payment provider.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::Money;

use crate::error::ProviderError;
use crate::provider::{
    IntentDetails, PaymentIntent, PaymentProvider, STATUS_APPROVED, STATUS_COMPLETED,
};

const STATUS_CREATED: &str = "CREATED";

#[derive(Debug, Clone)]
struct Intent {
    amount: Money,
    status: String,
    payer_email: Option<String>,
}

#[derive(Debug, Default)]
struct InMemoryProviderState {
    intents: HashMap<String, Intent>,
    next_id: u32,
    fail_on_create: bool,
    fail_on_capture: bool,
}

/// In-memory payment provider for development and tests.
///
/// Intents start out `CREATED`; [`approve`](Self::approve) plays the buyer's
/// part, after which the intent can be captured.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentProvider {
    state: Arc<Mutex<InMemoryProviderState>>,
}

impl InMemoryPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the provider to fail every create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state().fail_on_create = fail;
    }

    /// Configures the provider to fail every capture call.
    pub fn set_fail_on_capture(&self, fail: bool) {
        self.state().fail_on_capture = fail;
    }

    /// Marks an intent approved by the given payer. Returns false if unknown.
    pub fn approve(&self, intent_id: &str, payer_email: &str) -> bool {
        match self.state().intents.get_mut(intent_id) {
            Some(intent) => {
                intent.status = STATUS_APPROVED.to_string();
                intent.payer_email = Some(payer_email.to_string());
                true
            }
            None => false,
        }
    }

    /// Overrides the status the provider reports for an intent.
    pub fn set_status(&self, intent_id: &str, status: &str) {
        if let Some(intent) = self.state().intents.get_mut(intent_id) {
            intent.status = status.to_string();
        }
    }

    /// Returns the number of intents created so far.
    pub fn intent_count(&self) -> usize {
        self.state().intents.len()
    }

    /// Returns the status of an intent, if it exists.
    pub fn status_of(&self, intent_id: &str) -> Option<String> {
        self.state()
            .intents
            .get(intent_id)
            .map(|intent| intent.status.clone())
    }
}

fn details(id: &str, intent: &Intent) -> IntentDetails {
    IntentDetails {
        id: id.to_string(),
        status: intent.status.clone(),
        payer_email: intent.payer_email.clone(),
        amount: Some(intent.amount),
    }
}

#[async_trait]
impl PaymentProvider for InMemoryPaymentProvider {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, ProviderError> {
        let mut state = self.state();

        if state.fail_on_create {
            return Err(ProviderError::Status {
                status: 503,
                body: "Service unavailable".to_string(),
            });
        }

        state.next_id += 1;
        let id = format!("PAY-{:04}", state.next_id);
        state.intents.insert(
            id.clone(),
            Intent {
                amount,
                status: STATUS_CREATED.to_string(),
                payer_email: None,
            },
        );

        Ok(PaymentIntent {
            id,
            status: STATUS_CREATED.to_string(),
        })
    }

    async fn get_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError> {
        self.state()
            .intents
            .get(intent_id)
            .map(|intent| details(intent_id, intent))
            .ok_or_else(|| ProviderError::UnknownIntent(intent_id.to_string()))
    }

    async fn capture_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError> {
        let mut state = self.state();
        let fail = state.fail_on_capture;

        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| ProviderError::UnknownIntent(intent_id.to_string()))?;

        if fail {
            return Err(ProviderError::Status {
                status: 422,
                body: "INSTRUMENT_DECLINED".to_string(),
            });
        }
        if intent.status != STATUS_APPROVED {
            return Err(ProviderError::Status {
                status: 422,
                body: format!("ORDER_NOT_APPROVED ({})", intent.status),
            });
        }

        intent.status = STATUS_COMPLETED.to_string();
        Ok(details(intent_id, intent))
    }
}
