//! Payment domain - HitPay request values, statuses, and webhook reconciliation.
//!
//! # Module Organization
//!
//! - `signature` - HMAC-SHA256 signing and constant-time verification
//! - `status` - Processor status vocabularies
//! - `requests` - Validated outbound request values
//! - `webhook_event` - Inbound notification kinds and verified events
//! - `webhook_processor` - Applies verified notifications to orders

mod errors;
mod requests;
mod signature;
mod status;
mod webhook_errors;
mod webhook_event;
mod webhook_processor;

pub use errors::RequestValidationError;
pub use requests::{
    PaymentRequest, PaymentRequestParams, RecurringBillingParams, RecurringBillingRequest,
    RecurringChargeRequest, RefundRequest,
};
pub use signature::{sign, verify, SignatureVerifier, SIGNATURE_FIELD};
pub use status::{NotificationStatus, PaymentRequestStatus, RecurringBillingStatus};
pub use webhook_errors::WebhookError;
pub use webhook_event::{Correlation, WebhookEvent, WebhookKind};
pub use webhook_processor::{WebhookOutcome, WebhookProcessor};
