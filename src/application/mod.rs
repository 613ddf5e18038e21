//! Application layer - host-facing payment operations.
//!
//! Orchestrates the domain and the ports: starting checkout, applying
//! notifications, charging renewals, and refunding.

mod gateway;

pub use gateway::{
    refund_note, CheckoutOutcome, GatewaySettings, HitPayGateway, PaymentProcessor,
    RecurringChargeOutcome,
};
