//! HTTP API for the storefront service.
//!
//! Provides REST endpoints for the product catalog, orders and PayPal
//! payments, with JWT authentication, structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::{Auth, Claims, JwtKeys};
pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, SharedProvider};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>).put(routes::products::update::<S>),
        )
        .route(
            "/orders",
            get(routes::orders::list::<S>).post(routes::orders::create::<S>),
        )
        .route("/orders/my", get(routes::orders::mine::<S>))
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>)
                .put(routes::orders::update_status::<S>)
                .delete(routes::orders::delete::<S>),
        )
        .route("/orders/{id}/payment", put(routes::orders::update_payment::<S>))
        .route("/payments/create", post(routes::payments::create::<S>))
        .route(
            "/payments/capture/{intent_id}",
            post(routes::payments::capture::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
