//! Stored documents: products and orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DeliveryStatus, Money, OrderId, PaymentStatus, ProductId, StoreError, UserId};

/// A catalog product.
///
/// `price`, `total_stock` and `in_stock` are only changed through methods so
/// that `price` always follows `actual_price`/`discount` and
/// `in_stock == (total_stock > 0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    actual_price: Money,
    discount: u8,
    price: Money,
    total_stock: u32,
    in_stock: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with a fresh id, deriving price and stock flag.
    pub fn new(name: impl Into<String>, actual_price: Money, discount: u8, total_stock: u32) -> Self {
        let now = Utc::now();
        let mut product = Self {
            id: ProductId::new(),
            name: name.into(),
            description: None,
            category: None,
            actual_price,
            discount: 0,
            price: actual_price,
            total_stock: 0,
            in_stock: false,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        product.set_pricing(actual_price, discount);
        product.set_total_stock(total_stock);
        product
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Rebuilds a product from stored columns, re-deriving the dependent fields.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: ProductId,
        name: String,
        description: Option<String>,
        category: Option<String>,
        actual_price: Money,
        discount: u8,
        total_stock: u32,
        image_url: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut product = Self {
            id,
            name,
            description,
            category,
            actual_price,
            discount: 0,
            price: actual_price,
            total_stock: 0,
            in_stock: false,
            image_url,
            created_at,
            updated_at,
        };
        product.set_pricing(actual_price, discount);
        product.set_total_stock(total_stock);
        product.updated_at = updated_at;
        product
    }

    pub fn actual_price(&self) -> Money {
        self.actual_price
    }

    /// Discount in percent.
    pub fn discount(&self) -> u8 {
        self.discount
    }

    /// Final selling price after discount.
    pub fn price(&self) -> Money {
        self.price
    }

    pub fn total_stock(&self) -> u32 {
        self.total_stock
    }

    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    /// Sets list price and discount, recomputing the selling price.
    pub fn set_pricing(&mut self, actual_price: Money, discount: u8) {
        self.actual_price = actual_price;
        self.discount = discount.min(100);
        self.price = actual_price.discounted(self.discount);
        self.touch();
    }

    /// Sets the stock count and keeps `in_stock` in step with it.
    pub fn set_total_stock(&mut self, total_stock: u32) {
        self.total_stock = total_stock;
        self.in_stock = total_stock > 0;
        self.touch();
    }

    /// Decrements stock by `quantity` if enough is available.
    ///
    /// On failure the product is left untouched.
    pub fn try_decrement(&mut self, quantity: u32) -> Result<(), StoreError> {
        if !self.in_stock || quantity > self.total_stock {
            return Err(StoreError::InsufficientStock {
                product_id: self.id,
                requested: quantity,
                available: self.total_stock,
            });
        }
        self.set_total_stock(self.total_stock - quantity);
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Snapshot of a product taken when an order is placed.
///
/// Independent of later catalog edits; `product` is only a soft reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product: ProductId,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl LineItem {
    /// Copies name, price and image from the product as it is right now.
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product: product.id,
            name: product.name.clone(),
            price: product.price(),
            image_url: product.image_url.clone(),
            quantity,
        }
    }

    /// Returns `price * quantity`, or None if it overflows.
    pub fn total(&self) -> Option<Money> {
        self.price.checked_multiply(self.quantity)
    }
}

/// What the payment provider reported when the order was paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub provider_intent_id: String,
    pub status: String,
    pub payer_email: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    #[serde(rename = "products")]
    pub lines: Vec<LineItem>,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub payment_result: Option<PaymentResult>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order; the total is computed from the line snapshots
    /// once and never recomputed.
    ///
    /// Returns None if the total or a per-product quantity overflows.
    pub fn new(user_id: UserId, lines: Vec<LineItem>) -> Option<Self> {
        let now = Utc::now();
        let total_amount = lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.total()?)
        })?;
        let order = Self {
            id: OrderId::new(),
            user_id,
            lines,
            total_amount,
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Processing,
            payment_result: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        order.checked_quantities()?;
        Some(order)
    }

    /// Returns true if `user_id` owns this order.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Provider intent id of the recorded payment, if any.
    pub fn payment_intent_id(&self) -> Option<&str> {
        self.payment_result
            .as_ref()
            .map(|result| result.provider_intent_id.as_str())
    }

    /// Records a successful payment.
    pub fn mark_paid(&mut self, result: PaymentResult) {
        let now = Utc::now();
        self.payment_status = PaymentStatus::Paid;
        self.payment_result = Some(result);
        self.paid_at = Some(now);
        self.updated_at = now;
    }

    /// Quantity requested per product, summed across lines.
    ///
    /// Saturates at `u32::MAX`; orders built with `new` never reach it.
    pub fn quantities(&self) -> Vec<(ProductId, u32)> {
        let mut out: Vec<(ProductId, u32)> = Vec::new();
        for line in &self.lines {
            match out.iter_mut().find(|(id, _)| *id == line.product) {
                Some((_, qty)) => *qty = qty.saturating_add(line.quantity),
                None => out.push((line.product, line.quantity)),
            }
        }
        out
    }

    fn checked_quantities(&self) -> Option<Vec<(ProductId, u32)>> {
        let mut out: Vec<(ProductId, u32)> = Vec::new();
        for line in &self.lines {
            match out.iter_mut().find(|(id, _)| *id == line.product) {
                Some((_, qty)) => *qty = qty.checked_add(line.quantity)?,
                None => out.push((line.product, line.quantity)),
            }
        }
        Some(out)
    }
}
