//! Domain layer for the storefront service.
//!
//! This crate provides:
//! - `RequestContext`, the per-request identity every operation receives
//! - `CatalogService` for the product records orders are placed against
//! - `OrderService`, the order lifecycle manager: checkout with price
//!   snapshots and atomic stock decrement, admin status overrides, reads

pub mod catalog;
pub mod context;
pub mod error;
pub mod order;

pub use catalog::{CatalogError, CatalogService, NewProduct, ProductUpdate};
pub use context::{RequestContext, Role};
pub use error::DomainError;
pub use order::{OrderError, OrderLineRequest, OrderService, PlaceOrder, UpdateOrderStatus};
