//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{NewProduct, ProductUpdate};
use store::{DocumentStore, Product};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

use super::parse_id;

/// POST /products: create a product (admin).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn create<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(cmd) = body?;
    let product = state.catalog.create_product(&ctx, cmd).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products: list all products.
#[tracing::instrument(skip_all)]
pub async fn list<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products().await?))
}

/// GET /products/{id}: load a single product.
#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn get<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    Ok(Json(state.catalog.get_product(id).await?))
}

/// PUT /products/{id}: edit a product (admin).
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, product_id = %id))]
pub async fn update<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
    body: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let Json(update) = body?;
    Ok(Json(state.catalog.update_product(&ctx, id, update).await?))
}
