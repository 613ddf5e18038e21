//! Mock payment API for testing.
//!
//! Configurable implementation of `PaymentApi` for unit and integration tests:
//! - Canned responses per operation
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::payment::{
    PaymentRequest, RecurringBillingRequest, RecurringChargeRequest, RefundRequest,
};
use crate::ports::{
    ApiError, PaymentApi, PaymentRequestResponse, RecurringBillingResponse,
    RecurringChargeResponse, RefundResponse,
};

/// Mock payment API for testing.
///
/// Operations without a configured response fail with `invalid_response`,
/// the same way an empty processor body would.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentApi::new();
/// mock.set_payment_request_response(PaymentRequestResponse { .. });
/// mock.set_method_error("create_refund", ApiError::transport("timed out"));
///
/// let gateway = HitPayGateway::new(Arc::new(mock.clone()), orders, verifier, settings);
/// assert_eq!(mock.call_count("create_payment_request"), 1);
/// ```
#[derive(Default)]
pub struct MockPaymentApi {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    payment_request: Option<PaymentRequestResponse>,
    recurring_billing: Option<RecurringBillingResponse>,
    recurring_charge: Option<RecurringChargeResponse>,
    refund: Option<RefundResponse>,

    /// Specific errors by method name.
    method_errors: HashMap<String, ApiError>,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodCall {
    CreatePaymentRequest(PaymentRequest),
    CreateRecurringBilling(RecurringBillingRequest),
    ChargeRecurringBilling(RecurringChargeRequest),
    CreateRefund(RefundRequest),
}

impl MethodCall {
    pub fn method(&self) -> &'static str {
        match self {
            MethodCall::CreatePaymentRequest(_) => "create_payment_request",
            MethodCall::CreateRecurringBilling(_) => "create_recurring_billing",
            MethodCall::ChargeRecurringBilling(_) => "charge_recurring_billing",
            MethodCall::CreateRefund(_) => "create_refund",
        }
    }
}

impl MockPaymentApi {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    pub fn set_payment_request_response(&self, response: PaymentRequestResponse) {
        self.inner.lock().unwrap().payment_request = Some(response);
    }

    pub fn set_recurring_billing_response(&self, response: RecurringBillingResponse) {
        self.inner.lock().unwrap().recurring_billing = Some(response);
    }

    pub fn set_recurring_charge_response(&self, response: RecurringChargeResponse) {
        self.inner.lock().unwrap().recurring_charge = Some(response);
    }

    pub fn set_refund_response(&self, response: RefundResponse) {
        self.inner.lock().unwrap().refund = Some(response);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: ApiError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method() == method)
            .count()
    }

    /// Total calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.inner.lock().unwrap().call_log.len()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn respond<T: Clone>(
        &self,
        call: MethodCall,
        pick: impl FnOnce(&MockState) -> Option<T>,
    ) -> Result<T, ApiError> {
        let mut state = self.inner.lock().unwrap();
        let method = call.method();
        state.call_log.push(call);

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        pick(&*state).ok_or_else(|| ApiError::invalid_response("empty response body"))
    }
}

impl Clone for MockPaymentApi {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentApi for MockPaymentApi {
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRequestResponse, ApiError> {
        self.respond(MethodCall::CreatePaymentRequest(request.clone()), |s| {
            s.payment_request.clone()
        })
    }

    async fn create_recurring_billing(
        &self,
        request: &RecurringBillingRequest,
    ) -> Result<RecurringBillingResponse, ApiError> {
        self.respond(MethodCall::CreateRecurringBilling(request.clone()), |s| {
            s.recurring_billing.clone()
        })
    }

    async fn charge_recurring_billing(
        &self,
        request: &RecurringChargeRequest,
    ) -> Result<RecurringChargeResponse, ApiError> {
        self.respond(MethodCall::ChargeRecurringBilling(request.clone()), |s| {
            s.recurring_charge.clone()
        })
    }

    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundResponse, ApiError> {
        self.respond(MethodCall::CreateRefund(request.clone()), |s| s.refund.clone())
    }
}
