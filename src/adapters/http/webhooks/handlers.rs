//! HTTP handlers for HitPay notification endpoints.
//!
//! Both endpoints answer with an empty body. Only a storage failure yields a
//! non-2xx status, so HitPay retries exactly the deliveries that might still
//! succeed.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;

use crate::application::PaymentProcessor;
use crate::domain::payment::WebhookKind;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook endpoints.
#[derive(Clone)]
pub struct WebhookAppState {
    pub processor: Arc<dyn PaymentProcessor>,
}

impl WebhookAppState {
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self { processor }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/hitpay/regular-payments
pub async fn handle_regular_payment(
    State(state): State<WebhookAppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> StatusCode {
    dispatch(&state, WebhookKind::RegularPayment, form).await
}

/// POST /webhooks/hitpay/recurring-payments
pub async fn handle_recurring_payment(
    State(state): State<WebhookAppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> StatusCode {
    dispatch(&state, WebhookKind::RecurringPayment, form).await
}

async fn dispatch(
    state: &WebhookAppState,
    kind: WebhookKind,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> StatusCode {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            tracing::warn!(%kind, error = %rejection, "Unreadable notification body");
            return StatusCode::OK;
        }
    };

    match state.processor.handle_webhook(kind, fields).await {
        Ok(outcome) => {
            tracing::info!(%kind, ?outcome, "Notification processed");
            StatusCode::OK
        }
        Err(err) => {
            if err.is_retryable() {
                tracing::error!(%kind, error = %err, "Notification processing failed");
            } else {
                tracing::warn!(%kind, error = %err, "Notification rejected");
            }
            err.status_code()
        }
    }
}
