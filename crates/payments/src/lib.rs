//! Payment reconciliation for the storefront service.
//!
//! This crate provides:
//! - `PaymentProvider`, the seam to an external payment provider
//! - `PayPalClient`, the PayPal Orders v2 implementation
//! - `InMemoryPaymentProvider` for development and tests
//! - `PaymentReconciler`, which turns provider captures into paid orders

pub mod error;
pub mod memory;
pub mod paypal;
pub mod provider;
pub mod reconciliation;

pub use error::{PaymentError, ProviderError, Result};
pub use memory::InMemoryPaymentProvider;
pub use paypal::{PayPalClient, PayPalConfig, SANDBOX_API};
pub use provider::{IntentDetails, PaymentIntent, PaymentProvider};
pub use reconciliation::PaymentReconciler;
