//! Webhook error types for HitPay notification handling.
//!
//! Every rejection is acknowledged to the processor with an empty `200 OK` so
//! the response never reveals which check failed. Only a store failure after
//! successful verification asks for redelivery.

use axum::http::StatusCode;
use thiserror::Error;

use crate::ports::StoreError;

/// Errors that occur while processing a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// A field the notification kind requires was absent or empty.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The `hmac` field did not match the recomputed signature.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The reference did not resolve to an order.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The order store failed after the notification was verified.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Returns true if the processor should redeliver this notification.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_))
    }

    /// Maps the error to the HTTP status returned to the processor.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingField(_)
            | WebhookError::InvalidSignature
            | WebhookError::OrderNotFound(_) => StatusCode::OK,

            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        WebhookError::Store(err.0)
    }
}
