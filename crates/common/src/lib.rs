//! Shared types for the storefront service.
//!
//! Everything here is plain data: identifiers, money in cents and the two
//! status dimensions of an order. Crates further up the stack attach behaviour.

pub mod money;
pub mod status;
pub mod types;

pub use money::Money;
pub use status::{DeliveryStatus, PaymentStatus, UnknownStatus};
pub use types::{InvalidId, OrderId, ProductId, UserId};
