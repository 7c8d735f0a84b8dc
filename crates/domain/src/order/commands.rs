//! Order commands.

use common::{DeliveryStatus, Money, PaymentStatus, ProductId};
use serde::Deserialize;

use super::OrderError;

/// One requested cart line, as submitted by the client.
///
/// Kept loose (optional id, wide quantity) so malformed input is reported as
/// a validation error rather than a body parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    #[serde(default)]
    pub product: Option<String>,
    /// Defaults to 1 when absent.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl OrderLineRequest {
    pub fn new(product: ProductId, quantity: u32) -> Self {
        Self {
            product: Some(product.to_string()),
            quantity: Some(i64::from(quantity)),
        }
    }

    /// A line without an explicit quantity.
    pub fn single(product: ProductId) -> Self {
        Self {
            product: Some(product.to_string()),
            quantity: None,
        }
    }

    fn validate(&self) -> Result<(ProductId, u32), OrderError> {
        let raw = self.product.as_deref().unwrap_or_default();
        let product_id = raw
            .parse::<ProductId>()
            .map_err(|_| OrderError::InvalidProductId {
                value: raw.to_string(),
            })?;

        let quantity = self.quantity.unwrap_or(1);
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(OrderError::InvalidQuantity { quantity })?;

        Ok((product_id, quantity))
    }
}

/// Command to place an order from cart contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[serde(default, rename = "products")]
    pub lines: Vec<OrderLineRequest>,

    /// Client's own idea of the total, in cents. Only checked for sanity;
    /// the stored total is always computed from the price snapshots.
    #[serde(default)]
    pub total_amount: Option<i64>,
}

impl PlaceOrder {
    pub fn new(lines: Vec<OrderLineRequest>) -> Self {
        Self {
            lines,
            total_amount: None,
        }
    }

    pub fn with_total_amount(mut self, total: Money) -> Self {
        self.total_amount = Some(total.cents());
        self
    }

    /// Checks shape and returns `(product, quantity)` pairs in input order.
    pub fn validate(&self) -> Result<Vec<(ProductId, u32)>, OrderError> {
        if self.lines.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(total) = self.total_amount
            && total <= 0
        {
            return Err(OrderError::InvalidTotalAmount { total });
        }
        self.lines.iter().map(OrderLineRequest::validate).collect()
    }
}

/// Admin override of an order's status fields. Absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatus {
    pub delivery_status: Option<DeliveryStatus>,
    pub payment_status: Option<PaymentStatus>,
}
