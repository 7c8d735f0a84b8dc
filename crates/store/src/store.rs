use async_trait::async_trait;

use crate::{Order, OrderId, Product, ProductId, Result, StoreError, UserId};

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new product.
    ///
    /// Fails with `Duplicate` if a product with the same id exists.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Retrieves a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Retrieves all products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Writes a product's descriptive and pricing fields.
    ///
    /// Stock is not written: the stored `total_stock`/`in_stock` are kept, so
    /// an edit based on a stale read cannot undo a concurrent decrement.
    /// Returns the stored document. Fails with `ProductNotFound` if it does
    /// not exist.
    async fn update_product(&self, product: Product) -> Result<Product>;

    /// Overwrites a product's stock count, keeping `in_stock` in step.
    ///
    /// Returns the stored document. Fails with `ProductNotFound` if it does
    /// not exist.
    async fn set_product_stock(&self, id: ProductId, total_stock: u32) -> Result<Product>;

    /// Inserts an order and decrements stock for each of its lines.
    ///
    /// Each decrement is conditional on enough stock being available at the
    /// moment it is applied. The whole operation is atomic: if any product is
    /// missing or short, nothing is written and `ProductNotFound` or
    /// `InsufficientStock` is returned.
    async fn place_order(&self, order: Order) -> Result<()>;

    /// Retrieves an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Retrieves the orders owned by a user, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Finds the order whose payment result records `intent_id`.
    async fn find_order_by_intent(&self, intent_id: &str) -> Result<Option<Order>>;

    /// Replaces an existing order document.
    ///
    /// Fails with `OrderNotFound` if it does not exist, and with `Duplicate`
    /// if its payment intent id is already recorded on another order.
    async fn update_order(&self, order: Order) -> Result<()>;

    /// Deletes an order. Returns false if it did not exist.
    async fn delete_order(&self, id: OrderId) -> Result<bool>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Loads a product, turning absence into `ProductNotFound`.
    async fn require_product(&self, id: ProductId) -> Result<Product> {
        self.get_product(id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))
    }

    /// Loads an order, turning absence into `OrderNotFound`.
    async fn require_order(&self, id: OrderId) -> Result<Order> {
        self.get_order(id).await?.ok_or(StoreError::OrderNotFound(id))
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
