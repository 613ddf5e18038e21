//! Axum router configuration for HitPay notifications.

use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::application::PaymentProcessor;
use crate::domain::payment::WebhookKind;

use super::handlers::{handle_recurring_payment, handle_regular_payment, WebhookAppState};

/// Create the webhook routes.
///
/// # Routes
/// - `POST /webhooks/hitpay/regular-payments` - one-off payment notifications
/// - `POST /webhooks/hitpay/recurring-payments` - recurring billing notifications
///
/// No authentication: every body is verified against the HMAC signature.
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route(
            WebhookKind::RegularPayment.path(),
            post(handle_regular_payment),
        )
        .route(
            WebhookKind::RecurringPayment.path(),
            post(handle_recurring_payment),
        )
}

/// Create the complete webhook router with state and request tracing.
///
/// # Example
///
/// ```ignore
/// let gateway: Arc<dyn PaymentProcessor> = Arc::new(HitPayGateway::new(..));
/// let app = webhook_router(gateway);
/// axum::serve(listener, app).await?;
/// ```
pub fn webhook_router(processor: Arc<dyn PaymentProcessor>) -> Router {
    webhook_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(WebhookAppState::new(processor))
}
