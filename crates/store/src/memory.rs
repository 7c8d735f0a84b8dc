use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Order, OrderId, Product, ProductId, Result, StoreError, UserId, store::DocumentStore,
};

#[derive(Default)]
struct Documents {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory document store.
///
/// Products and orders share one lock, so `place_order` sees and changes a
/// consistent view of both.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<RwLock<Documents>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.documents.read().await.orders.len()
    }

}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        let mut documents = self.documents.write().await;
        if documents.products.contains_key(&product.id) {
            return Err(StoreError::Duplicate(format!("product {}", product.id)));
        }
        documents.products.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.documents.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let documents = self.documents.read().await;
        let mut products: Vec<_> = documents.products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn update_product(&self, mut product: Product) -> Result<Product> {
        let mut documents = self.documents.write().await;
        let existing = documents
            .products
            .get_mut(&product.id)
            .ok_or(StoreError::ProductNotFound(product.id))?;

        product.set_total_stock(existing.total_stock());
        *existing = product.clone();
        Ok(product)
    }

    async fn set_product_stock(&self, id: ProductId, total_stock: u32) -> Result<Product> {
        let mut documents = self.documents.write().await;
        let product = documents
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;

        product.set_total_stock(total_stock);
        Ok(product.clone())
    }

    async fn place_order(&self, order: Order) -> Result<()> {
        let mut documents = self.documents.write().await;

        if documents.orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(format!("order {}", order.id)));
        }

        // Apply every decrement to copies first so a failure leaves no trace.
        let mut updated = Vec::with_capacity(order.lines.len());
        for (product_id, quantity) in order.quantities() {
            let mut product = documents
                .products
                .get(&product_id)
                .cloned()
                .ok_or(StoreError::ProductNotFound(product_id))?;
            product.try_decrement(quantity)?;
            updated.push(product);
        }

        for product in updated {
            tracing::debug!(
                product_id = %product.id,
                remaining = product.total_stock(),
                "stock decremented"
            );
            documents.products.insert(product.id, product);
        }
        documents.orders.insert(order.id, order);

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.documents.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let documents = self.documents.read().await;
        let mut orders: Vec<_> = documents.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let documents = self.documents.read().await;
        let mut orders: Vec<_> = documents
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_order_by_intent(&self, intent_id: &str) -> Result<Option<Order>> {
        let documents = self.documents.read().await;
        Ok(documents
            .orders
            .values()
            .find(|o| o.payment_intent_id() == Some(intent_id))
            .cloned())
    }

    async fn update_order(&self, order: Order) -> Result<()> {
        let mut documents = self.documents.write().await;
        if let Some(intent_id) = order.payment_intent_id()
            && documents
                .orders
                .values()
                .any(|o| o.id != order.id && o.payment_intent_id() == Some(intent_id))
        {
            return Err(StoreError::Duplicate(format!("payment intent {intent_id}")));
        }
        match documents.orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order;
                Ok(())
            }
            None => Err(StoreError::OrderNotFound(order.id)),
        }
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        Ok(self.documents.write().await.orders.remove(&id).is_some())
    }
}
