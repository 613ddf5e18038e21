//! Webhook processor - applies verified HitPay notifications to orders.
//!
//! ## Steps
//!
//! 1. Require every field of the notification kind, signature included
//! 2. Strip `hmac` and verify it against the remaining fields
//! 3. Resolve the order; skip it unless it still needs payment
//! 4. Apply the status: record ids and mark paid, mark failed, or do nothing
//!
//! ## Duplicate Deliveries
//!
//! Step 3 makes a redelivery of a settled notification a no-op. Two deliveries
//! racing past step 3 are resolved by the store: `mark_paid` and `mark_failed`
//! are compare-and-set, so only one of them performs the transition. The
//! payment id and billing id travel with `mark_paid`, so the losing delivery
//! writes nothing. Subscriptions are linked only by the winner and never
//! overwrite an existing billing id.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::signature::{SignatureVerifier, SIGNATURE_FIELD};
use super::webhook_errors::WebhookError;
use super::webhook_event::{WebhookEvent, WebhookKind};
use crate::ports::{OrderStore, META_PAYMENT_ID, META_RECURRING_BILLING_ID};

/// What a processed notification did to its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// The order was marked paid by this delivery.
    PaymentCompleted { order_id: String },

    /// The order was marked failed by this delivery.
    PaymentFailed { order_id: String },

    /// The order no longer needed payment; nothing changed.
    AlreadySettled { order_id: String },

    /// The status carries no transition; nothing changed.
    Acknowledged { order_id: String, status: String },
}

/// Verifies notifications and reconciles order state.
pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    orders: Arc<dyn OrderStore>,
}

impl WebhookProcessor {
    pub fn new(verifier: SignatureVerifier, orders: Arc<dyn OrderStore>) -> Self {
        Self { verifier, orders }
    }

    /// Processes one notification delivery.
    ///
    /// Returns `Err` for deliveries that were discarded; see
    /// [`WebhookError::status_code`] for how each maps to a response.
    pub async fn process(
        &self,
        kind: WebhookKind,
        mut fields: HashMap<String, String>,
    ) -> Result<WebhookOutcome, WebhookError> {
        if let Err(err) = kind.check_required(&fields) {
            tracing::warn!(kind = %kind, error = %err, "Discarding incomplete notification");
            return Err(err);
        }

        let presented = fields
            .remove(SIGNATURE_FIELD)
            .ok_or(WebhookError::MissingField(SIGNATURE_FIELD))?;

        if !self.verifier.verify(&fields, &presented) {
            tracing::warn!(
                kind = %kind,
                reference = fields.get(kind.reference_field()).map(String::as_str).unwrap_or_default(),
                "Notification signature verification failed"
            );
            return Err(WebhookError::InvalidSignature);
        }

        let event = WebhookEvent::from_verified(kind, &fields)?;
        self.apply(event).await
    }

    async fn apply(&self, event: WebhookEvent) -> Result<WebhookOutcome, WebhookError> {
        let order = match self.orders.find_order(&event.reference).await? {
            Some(order) => order,
            None => {
                tracing::warn!(order_id = %event.reference, kind = %event.kind, "Notification for unknown order");
                return Err(WebhookError::OrderNotFound(event.reference));
            }
        };
        let order_id = order.id.clone();

        if !order.needs_payment() {
            tracing::debug!(order_id = %order_id, status = %event.status, "Order already settled");
            return Ok(WebhookOutcome::AlreadySettled { order_id });
        }

        if event.status.is_success() {
            let mut meta = vec![(META_PAYMENT_ID, event.payment_id.as_str())];
            if let Some(billing_id) = event.recurring_billing_id() {
                meta.push((META_RECURRING_BILLING_ID, billing_id));
            }

            if !self.orders.mark_paid(&order_id, &meta).await? {
                tracing::debug!(order_id = %order_id, "Lost settlement race");
                return Ok(WebhookOutcome::AlreadySettled { order_id });
            }

            if let Some(billing_id) = event.recurring_billing_id() {
                self.link_subscriptions(&order_id, billing_id).await?;
            }

            tracing::info!(
                order_id = %order_id,
                payment_id = %event.payment_id,
                kind = %event.kind,
                "Order marked paid"
            );
            return Ok(WebhookOutcome::PaymentCompleted { order_id });
        }

        if event.status.is_failure() {
            if self.orders.mark_failed(&order_id).await? {
                tracing::info!(order_id = %order_id, kind = %event.kind, "Order marked failed");
                return Ok(WebhookOutcome::PaymentFailed { order_id });
            }
            return Ok(WebhookOutcome::AlreadySettled { order_id });
        }

        tracing::debug!(order_id = %order_id, status = %event.status, "No transition for status");
        Ok(WebhookOutcome::Acknowledged {
            order_id,
            status: event.status.to_string(),
        })
    }

    /// Record the billing id on each subscription that has none yet.
    async fn link_subscriptions(&self, order_id: &str, billing_id: &str) -> Result<(), WebhookError> {
        for subscription in self.orders.subscriptions(order_id).await? {
            let linked = subscription
                .meta
                .get(META_RECURRING_BILLING_ID)
                .is_some_and(|id| !id.is_empty());
            if linked {
                continue;
            }
            self.orders
                .set_subscription_meta(&subscription.id, META_RECURRING_BILLING_ID, billing_id)
                .await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for WebhookProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookProcessor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{Order, OrderStatus, StoreError, Subscription};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::RwLock;

    const SALT: &str = "salt_test_12345";

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    /// Order store that records every transition attempt.
    struct MockOrderStore {
        orders: RwLock<HashMap<String, Order>>,
        subscriptions: RwLock<HashMap<String, Subscription>>,
        paid_transitions: AtomicU32,
        fail_writes: bool,
        /// Returned by `find_order` in place of the stored order.
        stale_snapshot: Option<Order>,
    }

    impl MockOrderStore {
        fn with_order(order: Order) -> Self {
            let mut orders = HashMap::new();
            orders.insert(order.id.clone(), order);
            Self {
                orders: RwLock::new(orders),
                subscriptions: RwLock::new(HashMap::new()),
                paid_transitions: AtomicU32::new(0),
                fail_writes: false,
                stale_snapshot: None,
            }
        }

        /// Stored order is `current`, but reads still see `snapshot`.
        fn with_stale_read(current: Order, snapshot: Order) -> Self {
            Self {
                stale_snapshot: Some(snapshot),
                ..Self::with_order(current)
            }
        }

        fn failing(order: Order) -> Self {
            Self {
                fail_writes: true,
                ..Self::with_order(order)
            }
        }

        async fn add_subscription(&self, id: &str) {
            self.subscriptions.write().await.insert(
                id.to_string(),
                Subscription {
                    id: id.to_string(),
                    meta: HashMap::new(),
                },
            );
        }

        async fn subscription_billing_id(&self, id: &str) -> Option<String> {
            self.subscriptions
                .read()
                .await
                .get(id)
                .and_then(|s| s.meta.get(META_RECURRING_BILLING_ID).cloned())
        }

        async fn order(&self, id: &str) -> Order {
            self.orders.read().await.get(id).cloned().unwrap()
        }

        fn write_guard(&self) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::new("write failed"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl OrderStore for MockOrderStore {
        async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
            if let Some(snapshot) = &self.stale_snapshot {
                return Ok(Some(snapshot.clone()));
            }
            Ok(self.orders.read().await.get(order_id).cloned())
        }

        async fn mark_paid(
            &self,
            order_id: &str,
            meta: &[(&str, &str)],
        ) -> Result<bool, StoreError> {
            self.write_guard()?;
            let mut orders = self.orders.write().await;
            match orders.get_mut(order_id) {
                Some(order) if order.needs_payment() => {
                    for (key, value) in meta {
                        order.meta.insert(key.to_string(), value.to_string());
                    }
                    order.status = OrderStatus::Paid;
                    self.paid_transitions.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn mark_failed(&self, order_id: &str) -> Result<bool, StoreError> {
            self.write_guard()?;
            let mut orders = self.orders.write().await;
            match orders.get_mut(order_id) {
                Some(order) if order.status == OrderStatus::Pending => {
                    order.status = OrderStatus::Failed;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn add_note(&self, _order_id: &str, _note: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn subscriptions(&self, _order_id: &str) -> Result<Vec<Subscription>, StoreError> {
            Ok(self.subscriptions.read().await.values().cloned().collect())
        }

        async fn set_subscription_meta(
            &self,
            subscription_id: &str,
            key: &str,
            value: &str,
        ) -> Result<(), StoreError> {
            if let Some(sub) = self.subscriptions.write().await.get_mut(subscription_id) {
                sub.meta.insert(key.to_string(), value.to_string());
            }
            Ok(())
        }
    }

    fn pending_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            status: OrderStatus::Pending,
            total: Decimal::new(1000, 2),
            currency: "SGD".to_string(),
            billing_first_name: "Ada".to_string(),
            billing_last_name: "Lovelace".to_string(),
            billing_email: "ada@example.com".to_string(),
            return_url: "https://shop.example/return".to_string(),
            contains_subscription: false,
            meta: HashMap::new(),
        }
    }

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(SecretString::new(SALT.to_string()))
    }

    fn signed(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut fields: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let signature = verifier().sign(&fields);
        fields.insert(SIGNATURE_FIELD.to_string(), signature);
        fields
    }

    fn regular(status: &str) -> HashMap<String, String> {
        signed(&[
            ("reference_number", "1001"),
            ("payment_id", "pay_1"),
            ("payment_request_id", "req_1"),
            ("status", status),
        ])
    }

    fn recurring(status: &str) -> HashMap<String, String> {
        signed(&[
            ("payment_id", "pay_2"),
            ("recurring_billing_id", "rb_1"),
            ("amount", "25.00"),
            ("currency", "sgd"),
            ("reference", "1001"),
            ("status", status),
        ])
    }

    fn processor(store: Arc<MockOrderStore>) -> WebhookProcessor {
        WebhookProcessor::new(verifier(), store)
    }

    // ══════════════════════════════════════════════════════════════
    // Regular Payments
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn completed_notification_marks_order_paid() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));

        let outcome = processor(store.clone())
            .process(WebhookKind::RegularPayment, regular("completed"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::PaymentCompleted {
                order_id: "1001".to_string()
            }
        );
        let order = store.order("1001").await;
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_id(), Some("pay_1"));
    }

    #[tokio::test]
    async fn failed_notification_marks_order_failed() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));

        let outcome = processor(store.clone())
            .process(WebhookKind::RegularPayment, regular("failed"))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::PaymentFailed { .. }));
        let order = store.order("1001").await;
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.payment_id(), None);
    }

    #[tokio::test]
    async fn unknown_status_is_acknowledged_without_change() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));

        let outcome = processor(store.clone())
            .process(WebhookKind::RegularPayment, regular("pending"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Acknowledged {
                order_id: "1001".to_string(),
                status: "pending".to_string()
            }
        );
        assert_eq!(store.order("1001").await.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn duplicate_completed_delivery_marks_paid_once() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));
        let processor = processor(store.clone());

        processor
            .process(WebhookKind::RegularPayment, regular("completed"))
            .await
            .unwrap();
        let second = processor
            .process(WebhookKind::RegularPayment, regular("completed"))
            .await
            .unwrap();

        assert!(matches!(second, WebhookOutcome::AlreadySettled { .. }));
        assert_eq!(store.paid_transitions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_deliveries_mark_paid_once() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));
        let processor = Arc::new(processor(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let processor = processor.clone();
                tokio::spawn(async move {
                    processor
                        .process(WebhookKind::RegularPayment, regular("completed"))
                        .await
                })
            })
            .collect();

        let mut completed = 0;
        for handle in handles {
            if let Ok(WebhookOutcome::PaymentCompleted { .. }) = handle.await.unwrap() {
                completed += 1;
            }
        }

        assert_eq!(completed, 1);
        assert_eq!(store.paid_transitions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn losing_delivery_keeps_winning_payment_id() {
        // Another delivery settled the order with pay_winner after this one
        // read it as pending.
        let mut settled = pending_order("1001");
        settled.status = OrderStatus::Paid;
        settled
            .meta
            .insert(META_PAYMENT_ID.to_string(), "pay_winner".to_string());
        let store = Arc::new(MockOrderStore::with_stale_read(
            settled,
            pending_order("1001"),
        ));

        let outcome = processor(store.clone())
            .process(WebhookKind::RegularPayment, regular("completed"))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::AlreadySettled { .. }));
        assert_eq!(store.order("1001").await.payment_id(), Some("pay_winner"));
        assert_eq!(store.paid_transitions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn losing_recurring_delivery_leaves_subscriptions_alone() {
        let mut settled = pending_order("1001");
        settled.status = OrderStatus::Paid;
        let store = Arc::new(MockOrderStore::with_stale_read(
            settled,
            pending_order("1001"),
        ));
        store.add_subscription("sub_1").await;

        processor(store.clone())
            .process(WebhookKind::RecurringPayment, recurring("succeeded"))
            .await
            .unwrap();

        assert_eq!(store.subscription_billing_id("sub_1").await, None);
        assert_eq!(store.order("1001").await.recurring_billing_id(), None);
    }

    #[tokio::test]
    async fn existing_subscription_billing_id_is_not_overwritten() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));
        store.add_subscription("sub_1").await;
        store.add_subscription("sub_2").await;
        store
            .set_subscription_meta("sub_2", META_RECURRING_BILLING_ID, "rb_old")
            .await
            .unwrap();

        processor(store.clone())
            .process(WebhookKind::RecurringPayment, recurring("succeeded"))
            .await
            .unwrap();

        assert_eq!(
            store.subscription_billing_id("sub_1").await.as_deref(),
            Some("rb_1")
        );
        assert_eq!(
            store.subscription_billing_id("sub_2").await.as_deref(),
            Some("rb_old")
        );
    }

    #[tokio::test]
    async fn failed_after_paid_is_ignored() {
        let mut order = pending_order("1001");
        order.status = OrderStatus::Paid;
        let store = Arc::new(MockOrderStore::with_order(order));

        let outcome = processor(store.clone())
            .process(WebhookKind::RegularPayment, regular("failed"))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::AlreadySettled { .. }));
        assert_eq!(store.order("1001").await.status, OrderStatus::Paid);
    }

    // ══════════════════════════════════════════════════════════════
    // Recurring Payments
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn succeeded_recurring_notification_records_billing_id() {
        let mut order = pending_order("1001");
        order.contains_subscription = true;
        let store = Arc::new(MockOrderStore::with_order(order));
        store.add_subscription("sub_1").await;
        store.add_subscription("sub_2").await;

        let outcome = processor(store.clone())
            .process(WebhookKind::RecurringPayment, recurring("succeeded"))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::PaymentCompleted { .. }));
        let order = store.order("1001").await;
        assert_eq!(order.payment_id(), Some("pay_2"));
        assert_eq!(order.recurring_billing_id(), Some("rb_1"));
        for sub in store.subscriptions.read().await.values() {
            assert_eq!(
                sub.meta.get(META_RECURRING_BILLING_ID).map(String::as_str),
                Some("rb_1")
            );
        }
    }

    #[tokio::test]
    async fn signed_notification_with_empty_amount_is_processed() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));
        let fields = signed(&[
            ("payment_id", "pay_2"),
            ("recurring_billing_id", "rb_1"),
            ("amount", ""),
            ("currency", ""),
            ("reference", "1001"),
            ("status", "succeeded"),
        ]);

        let outcome = processor(store.clone())
            .process(WebhookKind::RecurringPayment, fields)
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::PaymentCompleted { .. }));
        assert_eq!(store.order("1001").await.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn completed_recurring_notification_also_settles() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));

        let outcome = processor(store.clone())
            .process(WebhookKind::RecurringPayment, recurring("completed"))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::PaymentCompleted { .. }));
    }

    // ══════════════════════════════════════════════════════════════
    // Rejections
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_field_is_discarded_without_mutation() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));
        let mut fields = regular("completed");
        fields.remove("payment_request_id");

        let result = processor(store.clone())
            .process(WebhookKind::RegularPayment, fields)
            .await;

        assert_eq!(result, Err(WebhookError::MissingField("payment_request_id")));
        assert_eq!(store.order("1001").await, pending_order("1001"));
    }

    #[tokio::test]
    async fn tampered_notification_is_rejected() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));
        let mut fields = regular("failed");
        fields.insert("status".to_string(), "completed".to_string());

        let result = processor(store.clone())
            .process(WebhookKind::RegularPayment, fields)
            .await;

        assert_eq!(result, Err(WebhookError::InvalidSignature));
        assert_eq!(store.order("1001").await.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn signature_from_other_salt_is_rejected() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("1001")));
        let other = WebhookProcessor::new(
            SignatureVerifier::new(SecretString::new("other".to_string())),
            store.clone(),
        );

        let result = other
            .process(WebhookKind::RegularPayment, regular("completed"))
            .await;

        assert_eq!(result, Err(WebhookError::InvalidSignature));
    }

    #[tokio::test]
    async fn unknown_order_is_discarded() {
        let store = Arc::new(MockOrderStore::with_order(pending_order("9999")));

        let result = processor(store.clone())
            .process(WebhookKind::RegularPayment, regular("completed"))
            .await;

        assert_eq!(result, Err(WebhookError::OrderNotFound("1001".to_string())));
        assert_eq!(store.paid_transitions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_failure_is_retryable() {
        let store = Arc::new(MockOrderStore::failing(pending_order("1001")));

        let err = processor(store)
            .process(WebhookKind::RegularPayment, regular("completed"))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
    }
}
