//! Catalog service.

use common::ProductId;
use store::{DocumentStore, Product};

use crate::context::RequestContext;
use crate::error::DomainError;

use super::commands::{clamp_stock, validate_discount, validate_name, validate_price};
use super::{NewProduct, ProductUpdate};

/// Service for the product records that orders snapshot and decrement.
pub struct CatalogService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CatalogService<S> {
    /// Creates a new catalog service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a product. Admin only.
    ///
    /// The selling price is derived from list price and discount, and
    /// `in_stock` from the stock count.
    #[tracing::instrument(skip(self, ctx, cmd), fields(name = %cmd.name))]
    pub async fn create_product(
        &self,
        ctx: &RequestContext,
        cmd: NewProduct,
    ) -> Result<Product, DomainError> {
        ctx.require_admin()?;

        let name = validate_name(&cmd.name)?;
        let actual_price = validate_price(cmd.actual_price)?;
        let discount = validate_discount(cmd.discount.unwrap_or(0))?;
        let total_stock = clamp_stock(cmd.total_stock.unwrap_or(0));

        let mut product = Product::new(name, actual_price, discount, total_stock);
        product.description = cmd.description;
        product.category = cmd.category;
        product.image_url = cmd.image_url;

        self.store.insert_product(product.clone()).await?;
        tracing::info!(product_id = %product.id, price = %product.price(), total_stock, "product created");

        Ok(product)
    }

    /// Loads a product by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Lists all products, newest first.
    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products().await?)
    }

    /// Edits a product. Admin only.
    ///
    /// Existing orders keep their snapshots; only future orders see the change.
    /// Stock is only written when `total_stock` is supplied, so an edit never
    /// puts back units sold while it was in flight.
    #[tracing::instrument(skip(self, ctx, update))]
    pub async fn update_product(
        &self,
        ctx: &RequestContext,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, DomainError> {
        ctx.require_admin()?;

        let mut product = self.get_product(id).await?;

        if let Some(name) = update.name {
            product.name = validate_name(&name)?;
        }
        if let Some(description) = update.description {
            product.description = Some(description);
        }
        if let Some(category) = update.category {
            product.category = Some(category);
        }
        if let Some(image_url) = update.image_url {
            product.image_url = Some(image_url);
        }
        if update.actual_price.is_some() || update.discount.is_some() {
            let actual_price = match update.actual_price {
                Some(cents) => validate_price(cents)?,
                None => product.actual_price(),
            };
            let discount = match update.discount {
                Some(discount) => validate_discount(discount)?,
                None => product.discount(),
            };
            product.set_pricing(actual_price, discount);
        }

        let mut product = self.store.update_product(product).await?;
        if let Some(stock) = update.total_stock {
            product = self
                .store
                .set_product_stock(id, clamp_stock(stock))
                .await?;
        }

        tracing::info!(
            product_id = %product.id,
            total_stock = product.total_stock(),
            in_stock = product.in_stock(),
            "product updated"
        );

        Ok(product)
    }
}
