//! HitPay Gateway - payment processor integration
//!
//! Starts hosted checkout and recurring billing with HitPay, reconciles
//! orders from HMAC-signed notifications, charges saved cards for renewals,
//! and issues refunds.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
