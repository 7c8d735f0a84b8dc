//! Integration tests for payment reconciliation against in-memory backends.

use common::{Money, PaymentStatus, UserId};
use domain::{
    CatalogService, DomainError, NewProduct, OrderError, OrderLineRequest, OrderService,
    PlaceOrder, RequestContext, UpdateOrderStatus,
};
use payments::{InMemoryPaymentProvider, PaymentError, PaymentReconciler, ProviderError};
use store::{DocumentStoreExt, InMemoryStore, Order};

struct Harness {
    store: InMemoryStore,
    provider: InMemoryPaymentProvider,
    reconciler: PaymentReconciler<InMemoryStore, InMemoryPaymentProvider>,
    shopper: RequestContext,
}

async fn harness_with_order(cents: i64, quantity: u32) -> (Harness, Order) {
    let store = InMemoryStore::new();
    let provider = InMemoryPaymentProvider::new();
    let admin = RequestContext::admin(UserId::new(), "admin@example.com");
    let shopper = RequestContext::user(UserId::new(), "shopper@example.com");

    let product = CatalogService::new(store.clone())
        .create_product(&admin, NewProduct::new("Lamp", Money::from_cents(cents), 10))
        .await
        .unwrap();
    let order = OrderService::new(store.clone())
        .create_order(
            &shopper,
            PlaceOrder::new(vec![OrderLineRequest::new(product.id, quantity)]),
        )
        .await
        .unwrap();

    let harness = Harness {
        reconciler: PaymentReconciler::new(store.clone(), provider.clone()),
        store,
        provider,
        shopper,
    };
    (harness, order)
}

impl Harness {
    /// Places another order for the same shopper, copying `like`'s lines.
    async fn another_order(&self, like: &Order) -> Order {
        let lines = like
            .lines
            .iter()
            .map(|line| OrderLineRequest::new(line.product, line.quantity))
            .collect();
        OrderService::new(self.store.clone())
            .create_order(&self.shopper, PlaceOrder::new(lines))
            .await
            .unwrap()
    }

    async fn approved_intent(&self, cents: i64) -> String {
        let intent = self
            .reconciler
            .create_payment_intent(&self.shopper, cents)
            .await
            .unwrap();
        self.provider.approve(&intent.id, "buyer@example.com");
        intent.id
    }
}

mod create_intent {
    use super::*;

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let (h, _) = harness_with_order(1000, 1).await;

        for amount in [0, -5] {
            assert!(matches!(
                h.reconciler.create_payment_intent(&h.shopper, amount).await,
                Err(PaymentError::InvalidAmount { .. })
            ));
        }
        assert_eq!(h.provider.intent_count(), 0);
    }

    #[tokio::test]
    async fn provider_failure_surfaces() {
        let (h, _) = harness_with_order(1000, 1).await;
        h.provider.set_fail_on_create(true);

        assert!(matches!(
            h.reconciler.create_payment_intent(&h.shopper, 1000).await,
            Err(PaymentError::Provider(ProviderError::Status { status: 503, .. }))
        ));
    }
}

mod capture {
    use super::*;

    #[tokio::test]
    async fn approved_intent_is_captured_and_order_paid() {
        let (h, order) = harness_with_order(1250, 2).await;
        let intent_id = h.approved_intent(2500).await;

        let paid = h
            .reconciler
            .capture_intent(&h.shopper, &intent_id, order.id)
            .await
            .unwrap();

        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.paid_at.is_some());
        let result = paid.payment_result.unwrap();
        assert_eq!(result.provider_intent_id, intent_id);
        assert_eq!(result.status, "COMPLETED");
        assert_eq!(result.payer_email, "shopper@example.com");
        assert_eq!(h.provider.status_of(&intent_id).as_deref(), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn repeated_capture_stays_paid_and_overwrites_result() {
        let (h, order) = harness_with_order(1000, 1).await;
        let first = h.approved_intent(1000).await;
        let second = h.approved_intent(1000).await;

        let once = h
            .reconciler
            .capture_intent(&h.shopper, &first, order.id)
            .await
            .unwrap();
        let twice = h
            .reconciler
            .capture_intent(&h.shopper, &second, order.id)
            .await
            .unwrap();

        assert_eq!(twice.payment_status, PaymentStatus::Paid);
        assert_eq!(
            twice.payment_result.unwrap().provider_intent_id,
            second
        );
        assert!(twice.paid_at >= once.paid_at);
    }

    #[tokio::test]
    async fn one_intent_cannot_pay_a_second_order() {
        let (h, order) = harness_with_order(1000, 1).await;
        let other = h.another_order(&order).await;
        let intent_id = h.approved_intent(1000).await;

        h.reconciler
            .capture_intent(&h.shopper, &intent_id, order.id)
            .await
            .unwrap();

        assert!(matches!(
            h.reconciler
                .capture_intent(&h.shopper, &intent_id, other.id)
                .await,
            Err(PaymentError::Domain(DomainError::Order(
                OrderError::PaymentIntentInUse { .. }
            )))
        ));
        assert_eq!(h.provider.intent_count(), 1);

        let other = h.store.require_order(other.id).await.unwrap();
        assert_eq!(other.payment_status, PaymentStatus::Pending);
        assert!(other.payment_result.is_none());
    }

    #[tokio::test]
    async fn malformed_intent_id_never_reaches_provider() {
        let (h, order) = harness_with_order(1000, 1).await;

        assert!(matches!(
            h.reconciler
                .capture_intent(&h.shopper, "..%2F..%2Fv1%2Fidentity", order.id)
                .await,
            Err(PaymentError::InvalidIntentId)
        ));
        assert_eq!(
            h.store.require_order(order.id).await.unwrap().payment_status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_and_order_untouched() {
        let (h, order) = harness_with_order(1000, 1).await;
        let intent_id = h.approved_intent(1000).await;
        let stranger = RequestContext::user(UserId::new(), "stranger@example.com");

        let err = h
            .reconciler
            .capture_intent(&stranger, &intent_id, order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Domain(DomainError::Forbidden(_))));

        let stored = h.store.require_order(order.id).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert!(stored.payment_result.is_none());
        assert_eq!(h.provider.status_of(&intent_id).as_deref(), Some("APPROVED"));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (h, _) = harness_with_order(1000, 1).await;
        let intent_id = h.approved_intent(1000).await;

        assert!(matches!(
            h.reconciler
                .capture_intent(&h.shopper, &intent_id, common::OrderId::new())
                .await,
            Err(PaymentError::Domain(DomainError::OrderNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn failed_order_cannot_be_paid() {
        let (h, order) = harness_with_order(1000, 1).await;
        let admin = RequestContext::admin(UserId::new(), "admin@example.com");
        OrderService::new(h.store.clone())
            .update_order_status(
                &admin,
                order.id,
                UpdateOrderStatus {
                    delivery_status: None,
                    payment_status: Some(PaymentStatus::Failed),
                },
            )
            .await
            .unwrap();
        let intent_id = h.approved_intent(1000).await;

        assert!(matches!(
            h.reconciler
                .capture_intent(&h.shopper, &intent_id, order.id)
                .await,
            Err(PaymentError::Domain(DomainError::Order(
                OrderError::InvalidPaymentTransition { .. }
            )))
        ));
    }

    #[tokio::test]
    async fn unapproved_intent_is_rejected() {
        let (h, order) = harness_with_order(1000, 1).await;
        let intent = h
            .reconciler
            .create_payment_intent(&h.shopper, 1000)
            .await
            .unwrap();

        let err = h
            .reconciler
            .capture_intent(&h.shopper, &intent.id, order.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentError::Provider(ProviderError::NotPayable { .. })
        ));
        assert_eq!(
            h.store.require_order(order.id).await.unwrap().payment_status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn amount_mismatch_is_rejected() {
        let (h, order) = harness_with_order(1000, 1).await;
        let intent_id = h.approved_intent(1).await;

        assert!(matches!(
            h.reconciler
                .capture_intent(&h.shopper, &intent_id, order.id)
                .await,
            Err(PaymentError::Provider(ProviderError::AmountMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn verification_can_be_disabled() {
        let (h, order) = harness_with_order(1000, 1).await;
        let reconciler =
            PaymentReconciler::new(h.store.clone(), h.provider.clone()).with_verification(false);

        let paid = reconciler
            .capture_intent(&h.shopper, "client-says-paid", order.id)
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn payment_does_not_touch_stock() {
        let (h, order) = harness_with_order(1000, 3).await;
        let product_id = order.lines[0].product;
        h.provider.set_fail_on_capture(true);
        let intent_id = h.approved_intent(3000).await;

        assert!(h
            .reconciler
            .capture_intent(&h.shopper, &intent_id, order.id)
            .await
            .is_err());
        assert_eq!(
            h.store.require_product(product_id).await.unwrap().total_stock(),
            7
        );
    }
}

mod status_update {
    use super::*;

    #[tokio::test]
    async fn always_marks_paid_and_records_status_verbatim() {
        let (h, order) = harness_with_order(1000, 1).await;

        let paid = h
            .reconciler
            .update_payment_status(&h.shopper, order.id, "PAY-XYZ", "DECLINED")
            .await
            .unwrap();

        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        let result = paid.payment_result.unwrap();
        assert_eq!(result.status, "DECLINED");
        assert_eq!(result.provider_intent_id, "PAY-XYZ");
    }

    #[tokio::test]
    async fn reported_intent_cannot_pay_a_second_order() {
        let (h, order) = harness_with_order(1000, 1).await;
        let other = h.another_order(&order).await;

        h.reconciler
            .update_payment_status(&h.shopper, order.id, "PAY-XYZ", "COMPLETED")
            .await
            .unwrap();

        assert!(matches!(
            h.reconciler
                .update_payment_status(&h.shopper, other.id, "PAY-XYZ", "COMPLETED")
                .await,
            Err(PaymentError::Domain(DomainError::Order(
                OrderError::PaymentIntentInUse { .. }
            )))
        ));
        assert_eq!(
            h.store.require_order(other.id).await.unwrap().payment_status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn requires_owner_and_intent_id() {
        let (h, order) = harness_with_order(1000, 1).await;
        let stranger = RequestContext::user(UserId::new(), "stranger@example.com");

        assert!(matches!(
            h.reconciler
                .update_payment_status(&stranger, order.id, "PAY-1", "COMPLETED")
                .await,
            Err(PaymentError::Domain(DomainError::Forbidden(_)))
        ));
        assert!(matches!(
            h.reconciler
                .update_payment_status(&h.shopper, order.id, "", "COMPLETED")
                .await,
            Err(PaymentError::MissingIntentId)
        ));
    }
}
