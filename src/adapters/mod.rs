//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `hitpay` - HitPay REST API client (and a mock for tests)
//! - `http` - inbound notification endpoints (axum)
//! - `memory` - in-process order store

pub mod hitpay;
pub mod http;
pub mod memory;

pub use hitpay::{Credentials, HitPayApi, MockPaymentApi};
pub use http::webhook_router;
pub use memory::InMemoryOrderStore;
