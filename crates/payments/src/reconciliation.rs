//! Reconciles provider-side payments with local orders.

use common::{Money, OrderId};
use domain::{OrderService, RequestContext};
use store::{DocumentStore, Order, PaymentResult};

use crate::error::{PaymentError, ProviderError, Result};
use crate::provider::{
    IntentDetails, PaymentIntent, PaymentProvider, STATUS_COMPLETED, is_valid_intent_id,
};

/// Bridges the payment provider and the order lifecycle.
///
/// Payment never touches stock: a failed or abandoned payment leaves the
/// order's decrement in place.
pub struct PaymentReconciler<S: DocumentStore, P: PaymentProvider> {
    orders: OrderService<S>,
    provider: P,
    verify_capture: bool,
}

impl<S: DocumentStore, P: PaymentProvider> PaymentReconciler<S, P> {
    /// Creates a reconciler that verifies captures with the provider.
    pub fn new(store: S, provider: P) -> Self {
        Self {
            orders: OrderService::new(store),
            provider,
            verify_capture: true,
        }
    }

    /// Turns server-side capture verification on or off.
    ///
    /// With verification off, the client's word that the intent was captured
    /// is taken as is.
    pub fn with_verification(mut self, verify_capture: bool) -> Self {
        self.verify_capture = verify_capture;
        self
    }

    /// Creates a provider intent for `amount` cents.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn create_payment_intent(
        &self,
        ctx: &RequestContext,
        amount: i64,
    ) -> Result<PaymentIntent> {
        let money = Money::from_cents(amount);
        if !money.is_positive() {
            return Err(PaymentError::InvalidAmount { amount });
        }

        let intent = self.provider.create_intent(money).await?;
        metrics::counter!("payment_intents_created_total").increment(1);
        tracing::info!(intent_id = %intent.id, amount = %money, "payment intent created");

        Ok(intent)
    }

    /// Marks a local order paid after the buyer approved `intent_id`.
    ///
    /// Capturing an already paid order again keeps it paid and overwrites the
    /// recorded result.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn capture_intent(
        &self,
        ctx: &RequestContext,
        intent_id: &str,
        order_id: OrderId,
    ) -> Result<Order> {
        let intent_id = require_intent_id(intent_id)?;
        let order = self.orders.load_for_payment(ctx, order_id).await?;
        self.orders.ensure_intent_unused(&order, intent_id).await?;

        if self.verify_capture {
            let details = self.confirm_capture(intent_id).await?;
            check_amount(&details, order.total_amount)?;
        }

        let result = PaymentResult {
            provider_intent_id: intent_id.to_string(),
            status: STATUS_COMPLETED.to_string(),
            payer_email: ctx.email.clone(),
        };
        let order = self.orders.record_payment(order, result).await?;
        metrics::counter!("payments_captured_total", "path" => "capture").increment(1);

        Ok(order)
    }

    /// Records a payment the client reports directly.
    ///
    /// The order is always marked `Paid`; `status` is stored verbatim in the
    /// payment result.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn update_payment_status(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        intent_id: &str,
        status: &str,
    ) -> Result<Order> {
        let intent_id = require_intent_id(intent_id)?;
        let order = self.orders.load_for_payment(ctx, order_id).await?;
        self.orders.ensure_intent_unused(&order, intent_id).await?;

        if status != STATUS_COMPLETED {
            tracing::warn!(%order_id, status, "non-completed status reported, marking paid anyway");
        }

        let result = PaymentResult {
            provider_intent_id: intent_id.to_string(),
            status: status.to_string(),
            payer_email: ctx.email.clone(),
        };
        let order = self.orders.record_payment(order, result).await?;
        metrics::counter!("payments_captured_total", "path" => "status_update").increment(1);

        Ok(order)
    }

    /// Completed intents pass, approved ones are captured here, others fail.
    async fn confirm_capture(&self, intent_id: &str) -> Result<IntentDetails> {
        let details = self.provider.get_intent(intent_id).await?;

        if details.is_completed() {
            return Ok(details);
        }
        if details.is_approved() {
            tracing::info!(intent_id, "intent approved but not captured, capturing");
            let captured = self.provider.capture_intent(intent_id).await?;
            if captured.is_completed() {
                return Ok(captured);
            }
            return Err(not_payable(captured));
        }

        Err(not_payable(details))
    }
}

fn require_intent_id(intent_id: &str) -> Result<&str> {
    let intent_id = intent_id.trim();
    if intent_id.is_empty() {
        Err(PaymentError::MissingIntentId)
    } else if !is_valid_intent_id(intent_id) {
        Err(PaymentError::InvalidIntentId)
    } else {
        Ok(intent_id)
    }
}

fn not_payable(details: IntentDetails) -> PaymentError {
    ProviderError::NotPayable {
        intent_id: details.id,
        status: details.status,
    }
    .into()
}

fn check_amount(details: &IntentDetails, expected: Money) -> Result<()> {
    match details.amount {
        Some(captured) if captured != expected => {
            tracing::error!(
                intent_id = %details.id,
                %captured,
                %expected,
                "captured amount does not match order total"
            );
            Err(ProviderError::AmountMismatch { expected, captured }.into())
        }
        _ => Ok(()),
    }
}
