//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use payments::{PaymentError, ProviderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Payment reconciliation error.
    Payment(PaymentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Internal(msg) => internal(msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(msg: String) -> (StatusCode, String) {
    tracing::error!(error = %msg, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Order(
            OrderError::InvalidPaymentTransition { .. } | OrderError::PaymentIntentInUse { .. },
        ) => (StatusCode::CONFLICT, err.to_string()),
        DomainError::Order(_) | DomainError::Catalog(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "Order not found".to_string()),
        DomainError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, "Product not found".to_string())
        }
        DomainError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        DomainError::Store(_) => internal(err.to_string()),
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match err {
        PaymentError::Domain(err) => domain_error_to_response(err),
        PaymentError::Provider(err) => {
            tracing::error!(error = %err, "payment provider failure");
            (StatusCode::INTERNAL_SERVER_ERROR, provider_message(&err))
        }
        PaymentError::InvalidAmount { .. }
        | PaymentError::MissingIntentId
        | PaymentError::InvalidIntentId
        | PaymentError::InvalidOrderId => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

/// Raw provider responses and transport details stay in the logs.
fn provider_message(err: &ProviderError) -> String {
    match err {
        ProviderError::Status { .. } | ProviderError::Transport(_) | ProviderError::Malformed(_) => {
            "Payment provider error".to_string()
        }
        _ => err.to_string(),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, PaymentStatus, ProductId};
    use store::StoreError;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_domain_status_codes() {
        assert_eq!(
            status_of(DomainError::Order(OrderError::NoItems)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Order(OrderError::ProductNotFound(
                ProductId::new()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Order(OrderError::InvalidPaymentTransition {
                from: PaymentStatus::Paid,
                to: PaymentStatus::Pending,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::OrderNotFound(OrderId::new())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::Forbidden("Admins only".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::Store(StoreError::Corrupt("bad row".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    async fn body_of(err: impl Into<ApiError>) -> (StatusCode, serde_json::Value) {
        let response = err.into().into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_provider_body_is_not_echoed() {
        let (status, json) = body_of(PaymentError::Provider(ProviderError::Status {
            status: 401,
            body: r#"{"error":"invalid_client","debug_id":"f00"}"#.to_string(),
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Payment provider error");

        let (_, json) = body_of(PaymentError::Provider(ProviderError::Timeout)).await;
        assert_eq!(json["error"], "Payment provider timed out");
    }

    #[test]
    fn test_intent_errors() {
        assert_eq!(
            status_of(DomainError::Order(OrderError::PaymentIntentInUse {
                intent_id: "PAY-0001".to_string(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(PaymentError::InvalidIntentId),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_payment_status_codes() {
        assert_eq!(
            status_of(PaymentError::InvalidAmount { amount: 0 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PaymentError::Provider(ProviderError::Timeout)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(PaymentError::Domain(DomainError::Forbidden(
                "Not authorized to update this order".to_string()
            ))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ApiError::Unauthorized("no token".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }
}
