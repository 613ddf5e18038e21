//! Payment API port - outbound calls to the payment processor.
//!
//! Each operation submits one validated request value and either returns the
//! parsed processor response or an [`ApiError`]. The caller treats every error
//! as "could not confirm": a transport failure is never read as a definite
//! processor-side decline.
//!
//! There are no retries. A failed call is terminal for that request value.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::payment::{
    PaymentRequest, PaymentRequestStatus, RecurringBillingRequest, RecurringBillingStatus,
    RecurringChargeRequest, RefundRequest, RequestValidationError,
};

/// Port for the payment processor's HTTP API.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// Create a one-off payment link.
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRequestResponse, ApiError>;

    /// Create a recurring billing plan the customer completes by saving a card.
    async fn create_recurring_billing(
        &self,
        request: &RecurringBillingRequest,
    ) -> Result<RecurringBillingResponse, ApiError>;

    /// Charge the saved card of an existing recurring billing.
    async fn charge_recurring_billing(
        &self,
        request: &RecurringChargeRequest,
    ) -> Result<RecurringChargeResponse, ApiError>;

    /// Refund part or all of a completed payment.
    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundResponse, ApiError>;
}

/// Created payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequestResponse {
    /// Processor payment request id.
    #[serde(default)]
    pub id: Option<String>,

    pub status: PaymentRequestStatus,

    /// Hosted checkout page.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub reference_number: Option<String>,
}

/// Created recurring billing plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringBillingResponse {
    /// Recurring billing id used for later charges.
    #[serde(default)]
    pub id: Option<String>,

    pub status: RecurringBillingStatus,

    /// Hosted card-saving page.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub reference: Option<String>,
}

/// Result of charging a recurring billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringChargeResponse {
    /// Payment created by this charge.
    #[serde(default)]
    pub payment_id: Option<String>,

    #[serde(default)]
    pub recurring_billing_id: Option<String>,

    pub status: RecurringBillingStatus,

    #[serde(default)]
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub currency: Option<String>,
}

/// Created refund.
///
/// A 201 means the money moved, so every field but the id is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundResponse {
    /// Refund reference id.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub payment_id: Option<String>,

    #[serde(default)]
    pub amount_refunded: Option<Decimal>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

/// Errors from payment API operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for categorization.
    pub code: ApiErrorCode,

    /// Human-readable message.
    pub message: String,

    /// HTTP status returned by the processor, if a response arrived.
    pub http_status: Option<u16>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
        }
    }

    /// Network failure or timeout; no response was received.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Transport, message)
    }

    /// The processor answered with a status outside the expected set.
    pub fn unexpected_status(status: u16, body: &str) -> Self {
        Self {
            http_status: Some(status),
            ..Self::new(
                ApiErrorCode::UnexpectedStatus,
                format!("unexpected status {}: {}", status, truncate(body, 200)),
            )
        }
    }

    /// The response body was absent or could not be parsed.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidResponse, message)
    }

    /// The request could not be built locally.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, message)
    }

    /// True if no response was received.
    pub fn is_transport(&self) -> bool {
        self.code == ApiErrorCode::Transport
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<RequestValidationError> for ApiError {
    fn from(err: RequestValidationError) -> Self {
        ApiError::invalid_request(err.to_string())
    }
}

/// Payment API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    /// Network failure or timeout.
    Transport,

    /// Response status outside the operation's success set.
    UnexpectedStatus,

    /// Missing or malformed response body.
    InvalidResponse,

    /// Request rejected locally before sending.
    InvalidRequest,
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApiErrorCode::Transport => "transport",
            ApiErrorCode::UnexpectedStatus => "unexpected_status",
            ApiErrorCode::InvalidResponse => "invalid_response",
            ApiErrorCode::InvalidRequest => "invalid_request",
        };
        write!(f, "{}", s)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
