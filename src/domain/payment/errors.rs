//! Validation errors for outbound request values.

use rust_decimal::Decimal;
use thiserror::Error;

/// A request value could not be constructed.
///
/// These are rejected locally and never reach the processor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid email address for {0}")]
    InvalidEmail(&'static str),

    #[error("Charge count must be at least 1")]
    InvalidChargeCount,
}
