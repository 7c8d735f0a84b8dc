//! Domain error types.

use common::{OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An order rule was violated.
    #[error("{0}")]
    Order(#[from] OrderError),

    /// A catalog rule was violated.
    #[error("{0}")]
    Catalog(#[from] CatalogError),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The caller is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}
