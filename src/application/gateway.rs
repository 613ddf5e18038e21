//! HitPayGateway - the host-facing payment entry points.
//!
//! Chooses the request to build for each operation, submits it through the
//! `PaymentApi` port, and interprets the result. Every processor-side failure
//! collapses into a single "not confirmed" outcome; nothing here aborts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::payment::{
    PaymentRequest, PaymentRequestParams, PaymentRequestStatus, RecurringBillingParams,
    RecurringBillingRequest, RecurringBillingStatus, RecurringChargeRequest, RefundRequest,
    SignatureVerifier, WebhookError, WebhookKind, WebhookOutcome, WebhookProcessor,
};
use crate::ports::{
    ApiError, Order, OrderStore, PaymentApi, RefundResponse, META_PAYMENT_ID,
};

/// Processor local time offset (Asia/Singapore, no DST).
const PROCESSOR_UTC_OFFSET_HOURS: i64 = 8;

/// Capabilities the host platform composes into its checkout and routing.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Starts checkout for an order and returns where to send the customer.
    async fn initiate_payment(&self, order: &Order) -> CheckoutOutcome;

    /// Processes one inbound notification.
    async fn handle_webhook(
        &self,
        kind: WebhookKind,
        fields: HashMap<String, String>,
    ) -> Result<WebhookOutcome, WebhookError>;

    /// Charges a renewal order against its saved card.
    async fn charge_recurring(&self, order: &Order, amount: Decimal) -> RecurringChargeOutcome;

    /// Refunds part or all of an order's payment.
    ///
    /// Returns `true` only if the processor confirmed the refund.
    async fn refund(&self, order: &Order, amount: Decimal, reason: Option<&str>) -> bool;
}

/// Result of starting checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// Send the customer to the processor's hosted page.
    Redirect { url: String },

    /// Payment could not be started.
    Failed,
}

impl CheckoutOutcome {
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            CheckoutOutcome::Redirect { url } => Some(url.as_str()),
            CheckoutOutcome::Failed => None,
        }
    }
}

/// Result of a scheduled renewal charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringChargeOutcome {
    /// The processor captured the charge.
    Paid,

    /// The order has no recurring billing id; it was marked failed.
    MissingBillingId,

    /// The charge could not be confirmed; the order was left untouched.
    NotConfirmed,
}

/// Merchant settings used when building requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Shown to the payer as the payment purpose.
    pub store_name: String,

    /// Public origin the processor can reach, e.g. `https://shop.example`.
    pub public_base_url: String,

    /// Payment link lifetime. `None` leaves expiry to the processor.
    pub payment_link_ttl_minutes: Option<u32>,

    /// Payment-method slugs to offer. Empty offers all enabled methods.
    pub payment_methods: Vec<String>,

    /// Ask the processor to email receipts.
    pub send_email: bool,
}

impl GatewaySettings {
    /// Absolute URL the processor posts a notification kind to.
    pub fn webhook_url(&self, kind: WebhookKind) -> String {
        format!("{}{}", self.public_base_url.trim_end_matches('/'), kind.path())
    }
}

/// HitPay implementation of [`PaymentProcessor`].
pub struct HitPayGateway {
    api: Arc<dyn PaymentApi>,
    orders: Arc<dyn OrderStore>,
    webhooks: WebhookProcessor,
    settings: GatewaySettings,
    clock: fn() -> DateTime<Utc>,
}

impl HitPayGateway {
    pub fn new(
        api: Arc<dyn PaymentApi>,
        orders: Arc<dyn OrderStore>,
        verifier: SignatureVerifier,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            webhooks: WebhookProcessor::new(verifier, orders.clone()),
            api,
            orders,
            settings,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock (for testing).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Current time in the processor's timezone.
    fn processor_now(&self) -> NaiveDateTime {
        (self.clock)().naive_utc() + Duration::hours(PROCESSOR_UTC_OFFSET_HOURS)
    }

    async fn start_regular_payment(&self, order: &Order) -> CheckoutOutcome {
        let expiry_date = self
            .settings
            .payment_link_ttl_minutes
            .map(|ttl| self.processor_now() + Duration::minutes(i64::from(ttl)));

        let request = match PaymentRequest::new(PaymentRequestParams {
            amount: order.total,
            currency: order.currency.clone(),
            payer_name: order.billing_full_name(),
            payer_email: order.billing_email.clone(),
            purpose: self.settings.store_name.clone(),
            reference_number: order.id.clone(),
            redirect_url: order.return_url.clone(),
            webhook_url: self.settings.webhook_url(WebhookKind::RegularPayment),
            payment_methods: self.settings.payment_methods.clone(),
            allow_repeated_payments: false,
            expiry_date,
            send_email: self.settings.send_email,
        }) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Payment request rejected locally");
                return CheckoutOutcome::Failed;
            }
        };

        match self.api.create_payment_request(&request).await {
            Ok(response) if response.status == PaymentRequestStatus::Pending => {
                redirect_or_fail(&order.id, response.url)
            }
            Ok(response) => {
                tracing::warn!(
                    order_id = %order.id,
                    status = ?response.status,
                    "Payment request not pending"
                );
                CheckoutOutcome::Failed
            }
            Err(e) => {
                log_unconfirmed(&order.id, "create_payment_request", &e);
                CheckoutOutcome::Failed
            }
        }
    }

    async fn start_subscription_payment(&self, order: &Order) -> CheckoutOutcome {
        let request = match RecurringBillingRequest::new(RecurringBillingParams {
            plan_id: None,
            customer_email: order.billing_email.clone(),
            customer_name: order.billing_full_name(),
            start_date: self.processor_now().date(),
            redirect_url: order.return_url.clone(),
            reference: order.id.clone(),
            amount: order.total,
            currency: order.currency.clone(),
            webhook_url: self.settings.webhook_url(WebhookKind::RecurringPayment),
            save_card: true,
            charge_count: None,
            send_email: self.settings.send_email,
        }) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Recurring billing rejected locally");
                return CheckoutOutcome::Failed;
            }
        };

        match self.api.create_recurring_billing(&request).await {
            Ok(response) if response.status == RecurringBillingStatus::Scheduled => {
                redirect_or_fail(&order.id, response.url)
            }
            Ok(response) => {
                tracing::warn!(
                    order_id = %order.id,
                    status = ?response.status,
                    "Recurring billing not scheduled"
                );
                CheckoutOutcome::Failed
            }
            Err(e) => {
                log_unconfirmed(&order.id, "create_recurring_billing", &e);
                CheckoutOutcome::Failed
            }
        }
    }

    async fn record_refund(
        &self,
        order: &Order,
        response: &RefundResponse,
        requested: Decimal,
        reason: Option<&str>,
    ) {
        let note = refund_note(response, requested, &order.currency, reason);
        if let Err(e) = self.orders.add_note(&order.id, &note).await {
            tracing::error!(order_id = %order.id, refund_id = %response.id, error = %e, "Failed to record refund note");
        }
    }
}

#[async_trait]
impl PaymentProcessor for HitPayGateway {
    async fn initiate_payment(&self, order: &Order) -> CheckoutOutcome {
        if order.contains_subscription {
            self.start_subscription_payment(order).await
        } else {
            self.start_regular_payment(order).await
        }
    }

    async fn handle_webhook(
        &self,
        kind: WebhookKind,
        fields: HashMap<String, String>,
    ) -> Result<WebhookOutcome, WebhookError> {
        self.webhooks.process(kind, fields).await
    }

    async fn charge_recurring(&self, order: &Order, amount: Decimal) -> RecurringChargeOutcome {
        let billing_id = match order.recurring_billing_id() {
            Some(id) => id,
            None => {
                tracing::warn!(order_id = %order.id, "Renewal order has no recurring billing id");
                if let Err(e) = self.orders.mark_failed(&order.id).await {
                    tracing::error!(order_id = %order.id, error = %e, "Failed to mark renewal failed");
                }
                return RecurringChargeOutcome::MissingBillingId;
            }
        };

        let request = match RecurringChargeRequest::new(billing_id, amount, &order.currency) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Recurring charge rejected locally");
                return RecurringChargeOutcome::NotConfirmed;
            }
        };

        let response = match self.api.charge_recurring_billing(&request).await {
            Ok(response) => response,
            Err(e) => {
                log_unconfirmed(&order.id, "charge_recurring_billing", &e);
                return RecurringChargeOutcome::NotConfirmed;
            }
        };

        if response.status != RecurringBillingStatus::Succeeded {
            tracing::warn!(order_id = %order.id, status = ?response.status, "Recurring charge not succeeded");
            return RecurringChargeOutcome::NotConfirmed;
        }

        // The charge is captured from here on; store failures are logged, not retried.
        let meta: Vec<(&str, &str)> = response
            .payment_id
            .as_deref()
            .map(|payment_id| (META_PAYMENT_ID, payment_id))
            .into_iter()
            .collect();
        match self.orders.mark_paid(&order.id, &meta).await {
            Ok(true) => tracing::info!(order_id = %order.id, "Renewal order marked paid"),
            Ok(false) => tracing::debug!(order_id = %order.id, "Renewal order already settled"),
            Err(e) => tracing::error!(order_id = %order.id, error = %e, "Failed to mark renewal paid"),
        }
        RecurringChargeOutcome::Paid
    }

    async fn refund(&self, order: &Order, amount: Decimal, reason: Option<&str>) -> bool {
        if amount <= Decimal::ZERO {
            return false;
        }

        let payment_id = match order.payment_id() {
            Some(id) => id,
            None => {
                tracing::warn!(order_id = %order.id, "No payment id recorded; nothing to refund");
                return false;
            }
        };

        let request = match RefundRequest::new(payment_id, amount) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Refund rejected locally");
                return false;
            }
        };

        match self.api.create_refund(&request).await {
            Ok(response) => {
                tracing::info!(
                    order_id = %order.id,
                    refund_id = %response.id,
                    amount = ?response.amount_refunded,
                    "Refund created"
                );
                self.record_refund(order, &response, amount, reason).await;
                true
            }
            Err(e) => {
                log_unconfirmed(&order.id, "create_refund", &e);
                false
            }
        }
    }
}

impl std::fmt::Debug for HitPayGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitPayGateway")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn redirect_or_fail(order_id: &str, url: Option<String>) -> CheckoutOutcome {
    match url {
        Some(url) if !url.is_empty() => CheckoutOutcome::Redirect { url },
        _ => {
            tracing::warn!(order_id, "Processor response has no checkout url");
            CheckoutOutcome::Failed
        }
    }
}

fn log_unconfirmed(order_id: &str, operation: &'static str, error: &ApiError) {
    if error.is_transport() {
        tracing::warn!(order_id, operation, error = %error, "Processor unreachable; outcome unconfirmed");
    } else {
        tracing::error!(order_id, operation, error = %error, "Processor call failed");
    }
}

/// Audit note appended after a confirmed refund.
///
/// Amount and currency come from the processor's answer, falling back to the
/// requested amount and the order currency when the answer omits them.
pub fn refund_note(
    response: &RefundResponse,
    requested: Decimal,
    order_currency: &str,
    reason: Option<&str>,
) -> String {
    let amount = response.amount_refunded.unwrap_or(requested);
    let currency = response
        .currency
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(order_currency);
    let mut note = format!(
        "Refund was successful. Refund reference ID: {}. Amount: {} {}.",
        response.id,
        amount,
        currency.to_uppercase()
    );
    if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
        note.push_str(" Reason: ");
        note.push_str(reason);
    }
    note
}
