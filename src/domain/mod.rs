//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `payment` - HitPay request values, signatures, and webhook reconciliation

pub mod payment;
