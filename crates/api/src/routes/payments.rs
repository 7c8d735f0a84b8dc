//! Payment provider endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::OrderId;
use payments::PaymentError;
use serde::{Deserialize, Serialize};
use store::DocumentStore;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

use super::orders::{OrderSummary, PaymentResponse};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Amount in cents.
    #[serde(default)]
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub paypal_order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePaymentRequest {
    #[serde(default)]
    pub local_order_id: Option<String>,
}

/// POST /payments/create: open a provider intent for an amount.
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn create<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    let Json(req) = body?;
    let intent = state
        .payments
        .create_payment_intent(&ctx, req.amount)
        .await?;
    Ok(Json(CreatePaymentResponse {
        paypal_order_id: intent.id,
    }))
}

/// POST /payments/capture/{intentId}: mark the local order paid (owner).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, intent_id = %intent_id))]
pub async fn capture<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    Path(intent_id): Path<String>,
    body: Result<Json<CapturePaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let Json(req) = body?;
    let order_id = req
        .local_order_id
        .as_deref()
        .and_then(|raw| raw.parse::<OrderId>().ok())
        .ok_or(PaymentError::InvalidOrderId)?;

    let order = state
        .payments
        .capture_intent(&ctx, &intent_id, order_id)
        .await?;

    Ok(Json(PaymentResponse {
        message: "Payment captured and order updated",
        order: OrderSummary::from(order),
    }))
}
