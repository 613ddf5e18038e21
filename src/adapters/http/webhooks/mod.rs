//! HitPay notification endpoints.

mod handlers;
mod routes;

pub use handlers::{handle_recurring_payment, handle_regular_payment, WebhookAppState};
pub use routes::{webhook_router, webhook_routes};
