//! Order lifecycle: checkout, status overrides and reads.

mod commands;
mod service;

pub use commands::{OrderLineRequest, PlaceOrder, UpdateOrderStatus};
pub use service::OrderService;

use common::{PaymentStatus, ProductId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order has no lines.
    #[error("Products array is required and must not be empty")]
    NoItems,

    /// A line's product id is missing or malformed.
    #[error("Invalid product id: {value}")]
    InvalidProductId { value: String },

    /// A line's quantity is not a positive integer.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// The client-supplied total is not positive.
    #[error("Valid total amount is required")]
    InvalidTotalAmount { total: i64 },

    /// A line refers to a product that does not exist.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The product has no stock at all.
    #[error("{name} is currently out of stock.")]
    OutOfStock { product_id: ProductId, name: String },

    /// The product has some stock, but less than requested.
    #[error("Insufficient stock for {name}. Only {available} items available.")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: u32,
    },

    /// The order total does not fit in the money representation.
    #[error("Order total is too large")]
    TotalTooLarge,

    /// The provider payment already settled a different order.
    #[error("PayPal order {intent_id} has already been used to pay another order")]
    PaymentIntentInUse { intent_id: String },

    /// The payment status change would un-pay or resurrect a failed payment.
    #[error("Invalid payment status transition: {from} -> {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

impl OrderError {
    /// Short machine-friendly label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::NoItems
            | OrderError::InvalidProductId { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidTotalAmount { .. }
            | OrderError::TotalTooLarge => "validation",
            OrderError::ProductNotFound(_) => "product_not_found",
            OrderError::OutOfStock { .. } => "out_of_stock",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::InvalidPaymentTransition { .. } => "invalid_transition",
            OrderError::PaymentIntentInUse { .. } => "intent_in_use",
        }
    }
}
