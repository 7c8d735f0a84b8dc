//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use sqlx::PgPool;
use store::{
    DeliveryStatus, DocumentStore, DocumentStoreExt, LineItem, Money, Order, PaymentResult,
    PaymentStatus, PostgresStore, Product, StoreError, UserId,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, products")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed_product(store: &PostgresStore, name: &str, cents: i64, stock: u32) -> Product {
    let product = Product::new(name, Money::from_cents(cents), 0, stock)
        .with_category("lighting")
        .with_image_url(format!("/uploads/{name}.png"));
    store.insert_product(product.clone()).await.unwrap();
    product
}

#[tokio::test]
async fn product_roundtrip_keeps_derived_fields() {
    let store = get_test_store().await;
    let product = Product::new("Desk Lamp", Money::from_cents(4000), 25, 7)
        .with_description("Brass, adjustable");
    store.insert_product(product.clone()).await.unwrap();

    let loaded = store.require_product(product.id).await.unwrap();
    assert_eq!(loaded.name, "Desk Lamp");
    assert_eq!(loaded.price(), Money::from_cents(3000));
    assert_eq!(loaded.total_stock(), 7);
    assert!(loaded.in_stock());
    assert_eq!(loaded.description.as_deref(), Some("Brass, adjustable"));
}

#[tokio::test]
async fn place_order_decrements_stock_and_persists_snapshot() {
    let store = get_test_store().await;
    let product = seed_product(&store, "lamp", 1000, 5).await;

    let order = Order::new(UserId::new(), vec![LineItem::snapshot(&product, 2)]).unwrap();
    let order_id = order.id;
    store.place_order(order).await.unwrap();

    let product = store.require_product(product.id).await.unwrap();
    assert_eq!(product.total_stock(), 3);
    assert!(product.in_stock());

    let order = store.require_order(order_id).await.unwrap();
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 2);
    assert_eq!(order.lines[0].price, Money::from_cents(1000));
    assert_eq!(order.total_amount, Money::from_cents(2000));
    assert_eq!(order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn place_order_rolls_back_every_decrement_on_shortfall() {
    let store = get_test_store().await;
    let plenty = seed_product(&store, "plenty", 100, 10).await;
    let scarce = seed_product(&store, "scarce", 100, 1).await;

    let order = Order::new(
        UserId::new(),
        vec![
            LineItem::snapshot(&plenty, 3),
            LineItem::snapshot(&scarce, 2),
        ],
    )
    .unwrap();
    let err = store.place_order(order).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        }
    ));
    assert_eq!(
        store.require_product(plenty.id).await.unwrap().total_stock(),
        10
    );
    assert!(store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn last_unit_clears_in_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, "last", 100, 1).await;

    let order = Order::new(UserId::new(), vec![LineItem::snapshot(&product, 1)]).unwrap();
    store.place_order(order).await.unwrap();

    let product = store.require_product(product.id).await.unwrap();
    assert_eq!(product.total_stock(), 0);
    assert!(!product.in_stock());
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
    let store = get_test_store().await;
    let product = seed_product(&store, "contended", 100, 1).await;

    let attempts = (0..6).map(|_| {
        let store = store.clone();
        let order = Order::new(UserId::new(), vec![LineItem::snapshot(&product, 1)]).unwrap();
        tokio::spawn(async move { store.place_order(order).await })
    });
    let results = futures_util::future::join_all(attempts).await;

    let successes = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(()))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(
        store.require_product(product.id).await.unwrap().total_stock(),
        0
    );
}

#[tokio::test]
async fn order_status_and_payment_result_roundtrip() {
    let store = get_test_store().await;
    let product = seed_product(&store, "paid", 2500, 3).await;
    let user = UserId::new();

    let mut order = Order::new(user, vec![LineItem::snapshot(&product, 1)]).unwrap();
    store.place_order(order.clone()).await.unwrap();

    order.delivery_status = DeliveryStatus::Shipped;
    order.mark_paid(PaymentResult {
        provider_intent_id: "5O190127TN364715T".to_string(),
        status: "COMPLETED".to_string(),
        payer_email: "buyer@example.com".to_string(),
    });
    store.update_order(order.clone()).await.unwrap();

    let loaded = store.require_order(order.id).await.unwrap();
    assert_eq!(loaded.payment_status, PaymentStatus::Paid);
    assert_eq!(loaded.delivery_status, DeliveryStatus::Shipped);
    assert_eq!(loaded.payment_result, order.payment_result);
    assert!(loaded.paid_at.is_some());

    assert_eq!(store.list_orders_for_user(user).await.unwrap().len(), 1);
    assert!(store.list_orders_for_user(UserId::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_order_does_not_restore_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, "gone", 100, 4).await;

    let order = Order::new(UserId::new(), vec![LineItem::snapshot(&product, 3)]).unwrap();
    let order_id = order.id;
    store.place_order(order).await.unwrap();

    assert!(store.delete_order(order_id).await.unwrap());
    assert!(!store.delete_order(order_id).await.unwrap());
    assert_eq!(
        store.require_product(product.id).await.unwrap().total_stock(),
        1
    );
}

#[tokio::test]
async fn stale_product_edit_keeps_sold_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, "stale", 1000, 5).await;
    let mut edit = store.require_product(product.id).await.unwrap();

    let order = Order::new(UserId::new(), vec![LineItem::snapshot(&product, 3)]).unwrap();
    store.place_order(order).await.unwrap();

    edit.name = "Renamed".to_string();
    edit.set_pricing(Money::from_cents(2000), 50);
    let stored = store.update_product(edit).await.unwrap();

    assert_eq!(stored.name, "Renamed");
    assert_eq!(stored.price(), Money::from_cents(1000));
    assert_eq!(stored.total_stock(), 2);
    assert!(stored.in_stock());

    let restocked = store.set_product_stock(product.id, 0).await.unwrap();
    assert_eq!(restocked.total_stock(), 0);
    assert!(!restocked.in_stock());
}

#[tokio::test]
async fn payment_intent_settles_one_order() {
    let store = get_test_store().await;
    let product = seed_product(&store, "intent", 2500, 5).await;
    let user = UserId::new();

    let mut first = Order::new(user, vec![LineItem::snapshot(&product, 1)]).unwrap();
    let mut second = Order::new(user, vec![LineItem::snapshot(&product, 1)]).unwrap();
    store.place_order(first.clone()).await.unwrap();
    store.place_order(second.clone()).await.unwrap();

    let result = PaymentResult {
        provider_intent_id: "8MC585209K746392H".to_string(),
        status: "COMPLETED".to_string(),
        payer_email: "buyer@example.com".to_string(),
    };
    first.mark_paid(result.clone());
    store.update_order(first.clone()).await.unwrap();
    store.update_order(first.clone()).await.unwrap();

    let found = store
        .find_order_by_intent("8MC585209K746392H")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);

    second.mark_paid(result);
    assert!(matches!(
        store.update_order(second.clone()).await,
        Err(StoreError::Duplicate(_))
    ));
    assert_eq!(
        store.require_order(second.id).await.unwrap().payment_status,
        PaymentStatus::Pending
    );
}
