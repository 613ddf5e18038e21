//! HitPay payment processor adapter.
//!
//! Implements the `PaymentApi` port against the HitPay REST API:
//! - One-off payment requests
//! - Recurring billing creation and charges
//! - Refunds
//!
//! # Configuration
//!
//! `live_mode` selects between the live and sandbox base URLs. Every request
//! carries the API key header and times out after 15 seconds.

mod client;
mod form;
mod hitpay_adapter;
mod mock_payment_api;

pub use client::{ApiClient, Credentials, RawResponse, LIVE_BASE_URL, REQUEST_TIMEOUT, SANDBOX_BASE_URL};
pub use form::FormBody;
pub use hitpay_adapter::HitPayApi;
pub use mock_payment_api::{MethodCall, MockPaymentApi};
