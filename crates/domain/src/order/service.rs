//! Order lifecycle manager.

use std::collections::HashMap;

use common::{Money, OrderId, PaymentStatus, ProductId};
use store::{DocumentStore, LineItem, Order, PaymentResult, Product, StoreError};

use crate::context::RequestContext;
use crate::error::DomainError;

use super::{OrderError, PlaceOrder, UpdateOrderStatus};

/// Service for managing orders.
///
/// Checkout validates every line against the catalog before anything is
/// written, then hands the finished order to the store, which inserts it and
/// decrements stock in one atomic step.
pub struct OrderService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for the calling user.
    #[tracing::instrument(skip(self, ctx, cmd), fields(user_id = %ctx.user_id, lines = cmd.lines.len()))]
    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        cmd: PlaceOrder,
    ) -> Result<Order, DomainError> {
        let result = self.try_create_order(ctx, &cmd).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total_amount,
                    "order created"
                );
            }
            Err(DomainError::Order(err)) => {
                metrics::counter!("orders_rejected_total", "reason" => err.reason()).increment(1);
                tracing::warn!(error = %err, "order rejected");
            }
            Err(err) => {
                tracing::error!(error = %err, "order creation failed");
            }
        }

        result
    }

    async fn try_create_order(
        &self,
        ctx: &RequestContext,
        cmd: &PlaceOrder,
    ) -> Result<Order, DomainError> {
        let requested = cmd.validate()?;

        // Validation pass: nothing is written until every line checks out.
        let mut lines = Vec::with_capacity(requested.len());
        let mut seen_stock: HashMap<ProductId, u32> = HashMap::new();
        for (product_id, quantity) in requested {
            let product = self
                .store
                .get_product(product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(product_id))?;
            check_availability(&product, quantity)?;
            seen_stock.insert(product_id, product.total_stock());
            lines.push(LineItem::snapshot(&product, quantity));
        }

        let order = Order::new(ctx.user_id, lines).ok_or(OrderError::TotalTooLarge)?;

        if let Some(echo) = cmd.total_amount
            && echo != order.total_amount.cents()
        {
            tracing::warn!(
                client_total = %Money::from_cents(echo),
                computed_total = %order.total_amount,
                "client total differs from price snapshot, storing computed total"
            );
        }

        match self.store.place_order(order.clone()).await {
            Ok(()) => Ok(order),
            Err(StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            }) => {
                if lost_stock_race(&seen_stock, product_id, available) {
                    metrics::counter!("stock_conflicts_total").increment(1);
                    tracing::info!(%product_id, requested, available, "lost stock race");
                }
                let name = order
                    .lines
                    .iter()
                    .find(|line| line.product == product_id)
                    .map(|line| line.name.clone())
                    .unwrap_or_default();
                Err(if available == 0 {
                    OrderError::OutOfStock { product_id, name }
                } else {
                    OrderError::InsufficientStock {
                        product_id,
                        name,
                        requested,
                        available,
                    }
                }
                .into())
            }
            Err(StoreError::ProductNotFound(product_id)) => {
                Err(OrderError::ProductNotFound(product_id).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrites delivery and/or payment status. Admin only.
    ///
    /// The one rule enforced is that a paid order stays paid.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_order_status(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        update: UpdateOrderStatus,
    ) -> Result<Order, DomainError> {
        ctx.require_admin()?;
        let mut order = self.load(order_id).await?;

        if let Some(payment_status) = update.payment_status {
            if !order.payment_status.can_transition_to(payment_status) {
                return Err(OrderError::InvalidPaymentTransition {
                    from: order.payment_status,
                    to: payment_status,
                }
                .into());
            }
            order.payment_status = payment_status;
        }
        if let Some(delivery_status) = update.delivery_status {
            order.delivery_status = delivery_status;
        }
        order.updated_at = chrono::Utc::now();

        self.store.update_order(order.clone()).await?;
        tracing::info!(
            order_id = %order.id,
            payment_status = %order.payment_status,
            delivery_status = %order.delivery_status,
            "order status updated"
        );

        Ok(order)
    }

    /// Orders placed by the calling user, newest first.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn get_orders_for_user(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders_for_user(ctx.user_id).await?)
    }

    /// All orders, newest first. Admin only.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_all_orders(&self, ctx: &RequestContext) -> Result<Vec<Order>, DomainError> {
        ctx.require_admin()?;
        Ok(self.store.list_orders().await?)
    }

    /// A single order, visible to its owner and to administrators.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_order(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
    ) -> Result<Order, DomainError> {
        let order = self.load(order_id).await?;
        if !ctx.can_view(&order) {
            return Err(DomainError::Forbidden(
                "Not authorized to view this order".to_string(),
            ));
        }
        Ok(order)
    }

    /// Hard-deletes an order. Admin only. Stock is not restored.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_order(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
    ) -> Result<(), DomainError> {
        ctx.require_admin()?;
        if !self.store.delete_order(order_id).await? {
            return Err(DomainError::OrderNotFound(order_id));
        }
        tracing::info!(%order_id, "order deleted");
        Ok(())
    }

    /// Loads an order the caller is about to mark paid.
    ///
    /// Fails with `OrderNotFound`, with `Forbidden` for anyone but the owner,
    /// and with `InvalidPaymentTransition` if the payment already failed.
    pub async fn load_for_payment(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
    ) -> Result<Order, DomainError> {
        let order = self.load(order_id).await?;

        if let Err(err) = ctx.require_owner(&order) {
            tracing::warn!(
                %order_id,
                owner = %order.user_id,
                caller = %ctx.user_id,
                "order ownership mismatch"
            );
            return Err(err);
        }

        if !order.payment_status.can_mark_paid() {
            return Err(OrderError::InvalidPaymentTransition {
                from: order.payment_status,
                to: PaymentStatus::Paid,
            }
            .into());
        }

        Ok(order)
    }

    /// Fails with `PaymentIntentInUse` if `intent_id` already paid an order
    /// other than `order`.
    pub async fn ensure_intent_unused(
        &self,
        order: &Order,
        intent_id: &str,
    ) -> Result<(), DomainError> {
        match self.store.find_order_by_intent(intent_id).await? {
            Some(other) if other.id != order.id => {
                tracing::warn!(
                    order_id = %order.id,
                    paid_order_id = %other.id,
                    intent_id,
                    "payment intent reused"
                );
                Err(intent_in_use(intent_id))
            }
            _ => Ok(()),
        }
    }

    /// Marks a previously loaded order paid and persists it.
    ///
    /// Repeating this on a paid order keeps it paid and overwrites the
    /// payment result and timestamp. The store refuses an intent id that is
    /// already recorded on another order.
    pub async fn record_payment(
        &self,
        mut order: Order,
        result: PaymentResult,
    ) -> Result<Order, DomainError> {
        let intent_id = result.provider_intent_id.clone();
        order.mark_paid(result);
        match self.store.update_order(order.clone()).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => return Err(intent_in_use(&intent_id)),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(order_id = %order.id, "order marked paid");
        Ok(order)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }
}

fn intent_in_use(intent_id: &str) -> DomainError {
    OrderError::PaymentIntentInUse {
        intent_id: intent_id.to_string(),
    }
    .into()
}

/// True if stock moved between the validation pass and the write, meaning
/// another order won. Otherwise repeated lines for one product added up to
/// more than was ever available.
fn lost_stock_race(seen: &HashMap<ProductId, u32>, product_id: ProductId, available: u32) -> bool {
    seen.get(&product_id) != Some(&available)
}

/// Stock rules applied to each requested line, in this order.
fn check_availability(product: &Product, quantity: u32) -> Result<(), OrderError> {
    if !product.in_stock() || product.total_stock() == 0 {
        return Err(OrderError::OutOfStock {
            product_id: product.id,
            name: product.name.clone(),
        });
    }
    if quantity > product.total_stock() {
        return Err(OrderError::InsufficientStock {
            product_id: product.id,
            name: product.name.clone(),
            requested: quantity,
            available: product.total_stock(),
        });
    }
    Ok(())
}
