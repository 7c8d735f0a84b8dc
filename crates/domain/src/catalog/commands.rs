//! Catalog commands.

use common::Money;
use serde::Deserialize;

use super::CatalogError;

/// Highest accepted list price, in cents ($1,000,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Command to create a product.
///
/// Numeric fields are wide so out-of-range input can be reported instead of
/// failing deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// List price in cents.
    pub actual_price: i64,
    /// Discount in percent.
    pub discount: Option<i64>,
    /// Negative values are clamped to zero.
    pub total_stock: Option<i64>,
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Creates a command with only the required fields set.
    pub fn new(name: impl Into<String>, actual_price: Money, total_stock: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            actual_price: actual_price.cents(),
            discount: None,
            total_stock: Some(total_stock),
            image_url: None,
        }
    }

    pub fn with_discount(mut self, discount: i64) -> Self {
        self.discount = Some(discount);
        self
    }
}

/// Command to edit a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub actual_price: Option<i64>,
    pub discount: Option<i64>,
    pub total_stock: Option<i64>,
    pub image_url: Option<String>,
}

pub(super) fn validate_name(name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::NameRequired);
    }
    Ok(name.to_string())
}

pub(super) fn validate_price(cents: i64) -> Result<Money, CatalogError> {
    if !(1..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(CatalogError::InvalidPrice { price: cents });
    }
    Ok(Money::from_cents(cents))
}

pub(super) fn validate_discount(discount: i64) -> Result<u8, CatalogError> {
    u8::try_from(discount)
        .ok()
        .filter(|d| *d <= 100)
        .ok_or(CatalogError::InvalidDiscount { discount })
}

pub(super) fn clamp_stock(stock: i64) -> u32 {
    u32::try_from(stock.max(0)).unwrap_or(u32::MAX)
}
