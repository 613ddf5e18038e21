//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `OrderStore` - The host platform's orders and subscriptions
//! - `PaymentApi` - Outbound calls to the payment processor

mod order_store;
mod payment_api;

pub use order_store::{
    Order, OrderStatus, OrderStore, StoreError, Subscription, META_PAYMENT_ID,
    META_RECURRING_BILLING_ID,
};
pub use payment_api::{
    ApiError, ApiErrorCode, PaymentApi, PaymentRequestResponse, RecurringBillingResponse,
    RecurringChargeResponse, RefundResponse,
};
