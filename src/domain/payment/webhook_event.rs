//! Inbound HitPay notifications.
//!
//! A notification arrives as a flat form. It is untrusted until its `hmac`
//! verifies; only then is it turned into a [`WebhookEvent`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::signature::SIGNATURE_FIELD;
use super::status::NotificationStatus;
use super::webhook_errors::WebhookError;

/// Which notification endpoint was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookKind {
    /// Notification for a one-off payment request.
    RegularPayment,

    /// Notification for a recurring billing charge.
    RecurringPayment,
}

impl WebhookKind {
    /// Fields that must be present, signature included.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            WebhookKind::RegularPayment => &[
                "reference_number",
                "payment_id",
                "payment_request_id",
                "status",
                SIGNATURE_FIELD,
            ],
            WebhookKind::RecurringPayment => &[
                "payment_id",
                "recurring_billing_id",
                "amount",
                "currency",
                "reference",
                "status",
                SIGNATURE_FIELD,
            ],
        }
    }

    /// Field carrying the merchant order identifier.
    pub fn reference_field(&self) -> &'static str {
        match self {
            WebhookKind::RegularPayment => "reference_number",
            WebhookKind::RecurringPayment => "reference",
        }
    }

    /// Returns the first required field that is absent.
    ///
    /// Only presence is checked; an empty value is still signed data. The
    /// identifiers an event is built from are checked for content later, in
    /// [`WebhookEvent::from_verified`].
    pub fn check_required(&self, fields: &HashMap<String, String>) -> Result<(), WebhookError> {
        for name in self.required_fields() {
            if !fields.contains_key(*name) {
                return Err(WebhookError::MissingField(*name));
            }
        }
        Ok(())
    }

    /// Route the processor posts this kind of notification to.
    pub fn path(&self) -> &'static str {
        match self {
            WebhookKind::RegularPayment => "/webhooks/hitpay/regular-payments",
            WebhookKind::RecurringPayment => "/webhooks/hitpay/recurring-payments",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookKind::RegularPayment => "regular_payment",
            WebhookKind::RecurringPayment => "recurring_payment",
        }
    }
}

impl std::fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processor-side identifier a notification correlates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    PaymentRequest(String),
    RecurringBilling(String),
}

/// A verified notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub kind: WebhookKind,

    /// Merchant order identifier.
    pub reference: String,

    /// Processor payment id, kept on the order for refunds.
    pub payment_id: String,

    pub correlation: Correlation,

    pub status: NotificationStatus,

    /// Charged amount as sent by the processor (recurring only).
    pub amount: Option<String>,

    pub currency: Option<String>,
}

impl WebhookEvent {
    /// Builds an event from fields whose signature has already been verified.
    pub fn from_verified(
        kind: WebhookKind,
        fields: &HashMap<String, String>,
    ) -> Result<Self, WebhookError> {
        let field = |name: &'static str| -> Result<String, WebhookError> {
            fields
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(WebhookError::MissingField(name))
        };

        let correlation = match kind {
            WebhookKind::RegularPayment => Correlation::PaymentRequest(field("payment_request_id")?),
            WebhookKind::RecurringPayment => {
                Correlation::RecurringBilling(field("recurring_billing_id")?)
            }
        };

        Ok(Self {
            kind,
            reference: field(kind.reference_field())?,
            payment_id: field("payment_id")?,
            correlation,
            status: NotificationStatus::parse(&field("status")?),
            amount: fields.get("amount").cloned(),
            currency: fields.get("currency").cloned(),
        })
    }

    /// Recurring billing id, for recurring notifications.
    pub fn recurring_billing_id(&self) -> Option<&str> {
        match &self.correlation {
            Correlation::RecurringBilling(id) => Some(id.as_str()),
            Correlation::PaymentRequest(_) => None,
        }
    }
}
