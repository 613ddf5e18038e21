//! Outbound request values.
//!
//! Every request is assembled in one step from a plain parameter struct and
//! validated at construction. A constructed request is immutable; retrying an
//! operation means building a new value.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::RequestValidationError;

// ════════════════════════════════════════════════════════════════════════════════
// Payment Request
// ════════════════════════════════════════════════════════════════════════════════

/// Fields of a one-off payment link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequestParams {
    pub amount: Decimal,

    /// ISO 4217 code; normalized to lowercase.
    pub currency: String,

    pub payer_name: String,
    pub payer_email: String,

    /// Free-text purpose shown to the payer (usually the store name).
    pub purpose: String,

    /// Merchant order identifier round-tripped through the processor.
    pub reference_number: String,

    /// Where the payer lands after paying.
    pub redirect_url: String,

    /// Where the processor posts the payment notification.
    pub webhook_url: String,

    /// Processor payment-method slugs to offer. Empty means all enabled methods.
    #[serde(default)]
    pub payment_methods: Vec<String>,

    #[serde(default)]
    pub allow_repeated_payments: bool,

    /// Payment link expiry in processor local time.
    pub expiry_date: Option<NaiveDateTime>,

    #[serde(default)]
    pub send_email: bool,
}

/// A validated payment request.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    params: PaymentRequestParams,
}

impl PaymentRequest {
    pub fn new(mut params: PaymentRequestParams) -> Result<Self, RequestValidationError> {
        require_positive(params.amount)?;
        params.currency = normalize_currency(&params.currency)?;
        require_email(&params.payer_email, "payer_email")?;
        require("reference_number", &params.reference_number)?;
        require("redirect_url", &params.redirect_url)?;
        require("webhook_url", &params.webhook_url)?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PaymentRequestParams {
        &self.params
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Recurring Billing
// ════════════════════════════════════════════════════════════════════════════════

/// Fields of a recurring billing (saved card) plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringBillingParams {
    /// Processor subscription plan, if the plan is managed on the processor side.
    pub plan_id: Option<String>,

    pub customer_email: String,
    pub customer_name: String,

    /// First billing day in processor local time.
    pub start_date: NaiveDate,

    pub redirect_url: String,

    /// Merchant order identifier.
    pub reference: String,

    pub amount: Decimal,
    pub currency: String,
    pub webhook_url: String,

    #[serde(default)]
    pub save_card: bool,

    /// Number of times the card is charged. `None` means until cancelled.
    pub charge_count: Option<u32>,

    #[serde(default)]
    pub send_email: bool,
}

/// A validated recurring billing creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringBillingRequest {
    params: RecurringBillingParams,
}

impl RecurringBillingRequest {
    pub fn new(mut params: RecurringBillingParams) -> Result<Self, RequestValidationError> {
        require_positive(params.amount)?;
        params.currency = normalize_currency(&params.currency)?;
        require_email(&params.customer_email, "customer_email")?;
        require("reference", &params.reference)?;
        require("redirect_url", &params.redirect_url)?;
        require("webhook_url", &params.webhook_url)?;
        if let Some(plan_id) = &params.plan_id {
            require("plan_id", plan_id)?;
        }
        if params.charge_count == Some(0) {
            return Err(RequestValidationError::InvalidChargeCount);
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &RecurringBillingParams {
        &self.params
    }
}

/// A charge against an existing recurring billing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringChargeRequest {
    recurring_billing_id: String,
    amount: Decimal,
    currency: String,
}

impl RecurringChargeRequest {
    pub fn new(
        recurring_billing_id: impl Into<String>,
        amount: Decimal,
        currency: &str,
    ) -> Result<Self, RequestValidationError> {
        let recurring_billing_id = recurring_billing_id.into();
        require("recurring_billing_id", &recurring_billing_id)?;
        require_positive(amount)?;
        Ok(Self {
            recurring_billing_id,
            amount,
            currency: normalize_currency(currency)?,
        })
    }

    pub fn recurring_billing_id(&self) -> &str {
        &self.recurring_billing_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Refund
// ════════════════════════════════════════════════════════════════════════════════

/// A refund against a completed payment.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundRequest {
    payment_id: String,
    amount: Decimal,
}

impl RefundRequest {
    pub fn new(payment_id: impl Into<String>, amount: Decimal) -> Result<Self, RequestValidationError> {
        let payment_id = payment_id.into();
        require("payment_id", &payment_id)?;
        require_positive(amount)?;
        Ok(Self { payment_id, amount })
    }

    pub fn payment_id(&self) -> &str {
        &self.payment_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Validation helpers
// ════════════════════════════════════════════════════════════════════════════════

fn require(field: &'static str, value: &str) -> Result<(), RequestValidationError> {
    if value.trim().is_empty() {
        return Err(RequestValidationError::MissingField(field));
    }
    Ok(())
}

fn require_positive(amount: Decimal) -> Result<(), RequestValidationError> {
    if amount <= Decimal::ZERO {
        return Err(RequestValidationError::NonPositiveAmount(amount));
    }
    Ok(())
}

fn require_email(value: &str, field: &'static str) -> Result<(), RequestValidationError> {
    require(field, value)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(RequestValidationError::InvalidEmail(field)),
    }
}

/// Lowercases a three-letter ISO 4217 code.
pub(crate) fn normalize_currency(code: &str) -> Result<String, RequestValidationError> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RequestValidationError::InvalidCurrency(code.to_string()));
    }
    Ok(code.to_ascii_lowercase())
}
