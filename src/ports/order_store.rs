//! Order store port.
//!
//! The host platform owns orders and subscriptions. This port exposes the few
//! reads and state transitions the gateway needs.
//!
//! # Concurrency
//!
//! `mark_paid` and `mark_failed` are compare-and-set transitions: they only
//! act on an order that still needs payment and report whether this call made
//! the change. `mark_paid` writes the settlement metadata in the same step, so
//! a losing duplicate delivery leaves the order exactly as the winner left it.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order meta key holding the processor payment id (used for refunds).
pub const META_PAYMENT_ID: &str = "_hitpay_payment_id";

/// Order and subscription meta key holding the recurring billing id.
pub const META_RECURRING_BILLING_ID: &str = "_hitpay_recurring_billing_id";

/// Port for the host's order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Load an order snapshot.
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

    /// Mark an order paid if it still needs payment, setting `meta` on the
    /// order in the same atomic step.
    ///
    /// Returns `true` if this call performed the transition. When it returns
    /// `false` nothing was written.
    async fn mark_paid(&self, order_id: &str, meta: &[(&str, &str)]) -> Result<bool, StoreError>;

    /// Mark an order failed if it is still pending with a positive total.
    ///
    /// Returns `true` if this call performed the transition.
    async fn mark_failed(&self, order_id: &str) -> Result<bool, StoreError>;

    /// Append an audit note to an order.
    async fn add_note(&self, order_id: &str, note: &str) -> Result<(), StoreError>;

    /// Subscriptions created from an order.
    async fn subscriptions(&self, order_id: &str) -> Result<Vec<Subscription>, StoreError>;

    /// Set a metadata value on a subscription.
    async fn set_subscription_meta(
        &self,
        subscription_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError>;
}

/// Snapshot of a host order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier; also the reference sent to the processor.
    pub id: String,

    pub status: OrderStatus,

    /// Order total.
    pub total: Decimal,

    /// ISO 4217 currency code as stored by the host.
    pub currency: String,

    pub billing_first_name: String,
    pub billing_last_name: String,
    pub billing_email: String,

    /// Where the customer returns after checkout.
    pub return_url: String,

    /// Whether the order creates subscriptions.
    #[serde(default)]
    pub contains_subscription: bool,

    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl Order {
    /// An order needs payment while it is pending or failed and has a positive total.
    pub fn needs_payment(&self) -> bool {
        self.status.awaits_payment() && self.total > Decimal::ZERO
    }

    /// Billing first and last name joined with a space.
    pub fn billing_full_name(&self) -> String {
        format!("{} {}", self.billing_first_name, self.billing_last_name)
            .trim()
            .to_string()
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.meta(META_PAYMENT_ID)
    }

    pub fn recurring_billing_id(&self) -> Option<&str> {
        self.meta(META_RECURRING_BILLING_ID)
    }
}

/// Payment-relevant order states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment.
    Pending,

    /// Payment received.
    Paid,

    /// Payment failed; the customer may retry.
    Failed,

    /// Cancelled by the customer or merchant.
    Cancelled,

    /// Fully refunded.
    Refunded,
}

impl OrderStatus {
    pub fn awaits_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Failed)
    }
}

/// Subscription created from an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,

    #[serde(default)]
    pub meta: HashMap<String, String>,
}

/// Failure reported by the order store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Order store error: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
