//! Catalog records that orders are placed against.

mod commands;
mod service;

pub use commands::{MAX_PRICE_CENTS, NewProduct, ProductUpdate};
pub use service::CatalogService;

use thiserror::Error;

/// Errors that can occur when creating or editing products.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Product name is required.
    #[error("Product name is required")]
    NameRequired,

    /// List price must be positive and no more than `MAX_PRICE_CENTS`.
    #[error("Invalid price: {price} (must be between 1 and {max})", max = MAX_PRICE_CENTS)]
    InvalidPrice { price: i64 },

    /// Discount is a percentage.
    #[error("Invalid discount: {discount} (must be between 0 and 100)")]
    InvalidDiscount { discount: i64 },
}
