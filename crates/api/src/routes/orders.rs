//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, PaymentStatus};
use domain::{PlaceOrder, UpdateOrderStatus};
use serde::{Deserialize, Serialize};
use store::{DocumentStore, Order, PaymentResult};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

use super::parse_id;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateRequest {
    #[serde(default)]
    pub paypal_order_id: String,
    #[serde(default)]
    pub status: String,
}

// -- Response types --

/// Payment-relevant view of an order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<PaymentResult>,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            payment_status: order.payment_status,
            paid_at: order.paid_at,
            payment_result: order.payment_result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub message: &'static str,
    pub order: OrderSummary,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// -- Handlers --

/// POST /orders: place an order from cart contents.
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn create<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    body: Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(cmd) = body?;
    let order = state.orders.create_order(&ctx, cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/my: the caller's own orders.
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn mine<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.get_orders_for_user(&ctx).await?))
}

/// GET /orders: every order (admin).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn list<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.get_all_orders(&ctx).await?))
}

/// GET /orders/{id}: a single order (owner or admin).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, order_id = %id))]
pub async fn get<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    Ok(Json(state.orders.get_order(&ctx, id).await?))
}

/// PUT /orders/{id}: override delivery and payment status (admin).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, order_id = %id))]
pub async fn update_status<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
    body: Result<Json<UpdateOrderStatus>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let Json(update) = body?;
    Ok(Json(state.orders.update_order_status(&ctx, id, update).await?))
}

/// DELETE /orders/{id}: hard-delete an order (admin).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, order_id = %id))]
pub async fn delete<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    state.orders.delete_order(&ctx, id).await?;
    Ok(Json(MessageResponse {
        message: "Order deleted",
    }))
}

/// PUT /orders/{id}/payment: record a client-reported payment (owner).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, order_id = %id))]
pub async fn update_payment<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
    body: Result<Json<PaymentUpdateRequest>, JsonRejection>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let Json(req) = body?;

    let order = state
        .payments
        .update_payment_status(&ctx, id, &req.paypal_order_id, &req.status)
        .await?;

    Ok(Json(PaymentResponse {
        message: "Payment status updated successfully",
        order: order.into(),
    }))
}
