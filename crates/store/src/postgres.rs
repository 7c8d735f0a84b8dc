use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    DeliveryStatus, LineItem, Money, Order, OrderId, PaymentResult, PaymentStatus, Product,
    ProductId, Result, StoreError, UserId, store::DocumentStore,
};

const PRODUCT_COLUMNS: &str = "id, name, description, category, actual_price_cents, discount, \
     total_stock, image_url, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, lines, total_amount_cents, payment_status, \
     delivery_status, payment_result, paid_at, created_at, updated_at";

/// PostgreSQL-backed document store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let discount: i16 = row.try_get("discount")?;
        let total_stock: i64 = row.try_get("total_stock")?;

        Ok(Product::restore(
            ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            row.try_get("name")?,
            row.try_get("description")?,
            row.try_get("category")?,
            Money::from_cents(row.try_get("actual_price_cents")?),
            u8::try_from(discount)
                .map_err(|_| StoreError::Corrupt(format!("discount out of range: {discount}")))?,
            u32::try_from(total_stock)
                .map_err(|_| StoreError::Corrupt(format!("stock out of range: {total_stock}")))?,
            row.try_get("image_url")?,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
        ))
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let lines: serde_json::Value = row.try_get("lines")?;
        let lines: Vec<LineItem> = serde_json::from_value(lines)?;

        let payment_result: Option<serde_json::Value> = row.try_get("payment_result")?;
        let payment_result: Option<PaymentResult> =
            payment_result.map(serde_json::from_value).transpose()?;

        let payment_status: String = row.try_get("payment_status")?;
        let delivery_status: String = row.try_get("delivery_status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            lines,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            payment_status: payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            delivery_status: delivery_status
                .parse::<DeliveryStatus>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            payment_result,
            paid_at: row.try_get("paid_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn map_unique_violation(e: sqlx::Error, what: String) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return StoreError::Duplicate(what);
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, category, actual_price_cents, discount,
                                  price_cents, total_stock, in_stock, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.actual_price().cents())
        .bind(i16::from(product.discount()))
        .bind(product.price().cents())
        .bind(i64::from(product.total_stock()))
        .bind(product.in_stock())
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, format!("product {}", product.id)))?;

        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, product: Product) -> Result<Product> {
        // Stock columns are left alone; they only move through
        // `place_order` and `set_product_stock`.
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = $2, description = $3, category = $4, actual_price_cents = $5,
                discount = $6, price_cents = $7, image_url = $8, updated_at = $9
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.actual_price().cents())
        .bind(i16::from(product.discount()))
        .bind(product.price().cents())
        .bind(&product.image_url)
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product)
            .transpose()?
            .ok_or(StoreError::ProductNotFound(product.id))
    }

    async fn set_product_stock(&self, id: ProductId, total_stock: u32) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET total_stock = $2, in_stock = $2 > 0, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(i64::from(total_stock))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product)
            .transpose()?
            .ok_or(StoreError::ProductNotFound(id))
    }

    async fn place_order(&self, order: Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Decrement-if-sufficient per product. Concurrent writers serialize on
        // the row lock and re-check the WHERE clause against the latest stock.
        for (product_id, quantity) in order.quantities() {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET total_stock = total_stock - $1,
                    in_stock = (total_stock - $1) > 0,
                    updated_at = NOW()
                WHERE id = $2 AND total_stock >= $1
                "#,
            )
            .bind(i64::from(quantity))
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT total_stock FROM products WHERE id = $1")
                        .bind(product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;

                tracing::debug!(%product_id, requested = quantity, ?available, "stock decrement rejected");

                // Dropping the transaction rolls back earlier decrements.
                return Err(match available {
                    None => StoreError::ProductNotFound(product_id),
                    Some(available) => StoreError::InsufficientStock {
                        product_id,
                        requested: quantity,
                        available: u32::try_from(available).unwrap_or(0),
                    },
                });
            }
        }

        let payment_result = order
            .payment_result
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, lines, total_amount_cents, payment_status,
                                delivery_status, payment_result, paid_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(serde_json::to_value(&order.lines)?)
        .bind(order.total_amount.cents())
        .bind(order.payment_status.as_str())
        .bind(order.delivery_status.as_str())
        .bind(payment_result)
        .bind(order.paid_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_unique_violation(e, format!("order {}", order.id)))?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn find_order_by_intent(&self, intent_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_result->>'providerIntentId' = $1"
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update_order(&self, order: Order) -> Result<()> {
        let payment_result = order
            .payment_result
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        // Lines and total are immutable after creation and are not rewritten.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = $2, delivery_status = $3, payment_result = $4,
                paid_at = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.payment_status.as_str())
        .bind(order.delivery_status.as_str())
        .bind(payment_result)
        .bind(order.paid_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let intent = order.payment_intent_id().unwrap_or_default();
            Self::map_unique_violation(e, format!("payment intent {intent}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order.id));
        }
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
