//! Shared application state.

use std::sync::Arc;

use domain::{CatalogService, OrderService};
use payments::{PaymentProvider, PaymentReconciler};
use store::DocumentStore;

use crate::auth::JwtKeys;

/// Provider handle shared by the reconciler; concrete type chosen at startup.
pub type SharedProvider = Arc<dyn PaymentProvider>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S>,
    pub payments: PaymentReconciler<S, SharedProvider>,
    pub jwt: JwtKeys,
}

impl<S: DocumentStore + Clone> AppState<S> {
    /// Wires every service to the same store.
    pub fn new(store: S, provider: SharedProvider, jwt: JwtKeys, verify_capture: bool) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            payments: PaymentReconciler::new(store, provider).with_verification(verify_capture),
            jwt,
        }
    }
}
