//! Document store for the storefront service.
//!
//! Products and orders are stored as whole documents. The one operation that
//! touches several documents at once, [`DocumentStore::place_order`], is
//! atomic in every implementation: either the order is inserted and every
//! line's stock is decremented, or nothing changes.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{DeliveryStatus, Money, OrderId, PaymentStatus, ProductId, UserId};
pub use document::{LineItem, Order, PaymentResult, Product};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{DocumentStore, DocumentStoreExt};
