//! In-memory order store.
//!
//! Reference implementation of the `OrderStore` port for local runs and tests.
//! Transitions check and update under a single write lock, which makes
//! `mark_paid` and `mark_failed` atomic compare-and-set operations.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{Order, OrderStatus, OrderStore, StoreError, Subscription};

#[derive(Debug, Default)]
struct State {
    orders: HashMap<String, Order>,
    notes: HashMap<String, Vec<String>>,
    subscriptions: HashMap<String, Subscription>,
    /// order id -> subscription ids
    order_subscriptions: HashMap<String, Vec<String>>,
}

/// `OrderStore` backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    state: RwLock<State>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an order.
    pub async fn insert_order(&self, order: Order) {
        self.state
            .write()
            .await
            .orders
            .insert(order.id.clone(), order);
    }

    /// Attaches a subscription to an order.
    pub async fn insert_subscription(&self, order_id: &str, subscription: Subscription) {
        let mut state = self.state.write().await;
        state
            .order_subscriptions
            .entry(order_id.to_string())
            .or_default()
            .push(subscription.id.clone());
        state
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    pub async fn order(&self, order_id: &str) -> Option<Order> {
        self.state.read().await.orders.get(order_id).cloned()
    }

    pub async fn subscription(&self, subscription_id: &str) -> Option<Subscription> {
        self.state
            .read()
            .await
            .subscriptions
            .get(subscription_id)
            .cloned()
    }

    /// Notes added to an order, oldest first.
    pub async fn notes(&self, order_id: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .notes
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn not_found(order_id: &str) -> StoreError {
    StoreError::new(format!("order {} not found", order_id))
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.order(order_id).await)
    }

    async fn mark_paid(&self, order_id: &str, meta: &[(&str, &str)]) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| not_found(order_id))?;

        if !order.needs_payment() {
            return Ok(false);
        }
        for (key, value) in meta {
            order.meta.insert(key.to_string(), value.to_string());
        }
        order.status = OrderStatus::Paid;
        Ok(true)
    }

    async fn mark_failed(&self, order_id: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| not_found(order_id))?;

        if order.status != OrderStatus::Pending || !order.needs_payment() {
            return Ok(false);
        }
        order.status = OrderStatus::Failed;
        Ok(true)
    }

    async fn add_note(&self, order_id: &str, note: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.orders.contains_key(order_id) {
            return Err(not_found(order_id));
        }
        state
            .notes
            .entry(order_id.to_string())
            .or_default()
            .push(note.to_string());
        Ok(())
    }

    async fn subscriptions(&self, order_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let state = self.state.read().await;
        let subscriptions = state
            .order_subscriptions
            .get(order_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.subscriptions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(subscriptions)
    }

    async fn set_subscription_meta(
        &self,
        subscription_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| StoreError::new(format!("subscription {} not found", subscription_id)))?;
        subscription.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
