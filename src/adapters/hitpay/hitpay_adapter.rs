//! HitPay payment API adapter.
//!
//! Implements the `PaymentApi` port: encodes each request value, posts it to
//! the operation's path, checks the status against the operation's success
//! set, and parses the JSON body.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::payment::{
    PaymentRequest, RecurringBillingRequest, RecurringChargeRequest, RefundRequest,
};
use crate::ports::{
    ApiError, PaymentApi, PaymentRequestResponse, RecurringBillingResponse,
    RecurringChargeResponse, RefundResponse,
};

use super::client::{ApiClient, Credentials, RawResponse};
use super::form;

const PAYMENT_REQUESTS_PATH: &str = "payment-requests";
const RECURRING_BILLING_PATH: &str = "recurring-billing";
const RECURRING_CHARGE_PATH: &str = "charge/recurring-billing";
const REFUND_PATH: &str = "refund";

const CREATED: &[u16] = &[201];
const OK_OR_CREATED: &[u16] = &[200, 201];

/// HitPay implementation of [`PaymentApi`].
#[derive(Debug, Clone)]
pub struct HitPayApi {
    client: ApiClient,
}

impl HitPayApi {
    pub fn new(credentials: &Credentials) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(credentials)?,
        })
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    async fn submit<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: form::FormBody,
        expected: &[u16],
    ) -> Result<T, ApiError> {
        let raw = self.client.post(path, body.as_pairs()).await?;
        parse_response(operation, raw, expected)
    }
}

fn parse_response<T: DeserializeOwned>(
    operation: &'static str,
    raw: RawResponse,
    expected: &[u16],
) -> Result<T, ApiError> {
    if !expected.contains(&raw.status) {
        tracing::error!(
            operation,
            status = raw.status,
            body = %raw.body,
            "HitPay returned unexpected status"
        );
        return Err(ApiError::unexpected_status(raw.status, &raw.body));
    }

    if raw.body.trim().is_empty() {
        tracing::error!(operation, "HitPay returned empty body");
        return Err(ApiError::invalid_response("empty response body"));
    }

    serde_json::from_str(&raw.body).map_err(|e| {
        tracing::error!(operation, error = %e, "Failed to parse HitPay response");
        ApiError::invalid_response(format!("failed to parse {} response: {}", operation, e))
    })
}

#[async_trait]
impl PaymentApi for HitPayApi {
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRequestResponse, ApiError> {
        self.submit(
            "create_payment_request",
            PAYMENT_REQUESTS_PATH,
            form::payment_request(request),
            CREATED,
        )
        .await
    }

    async fn create_recurring_billing(
        &self,
        request: &RecurringBillingRequest,
    ) -> Result<RecurringBillingResponse, ApiError> {
        self.submit(
            "create_recurring_billing",
            RECURRING_BILLING_PATH,
            form::recurring_billing(request),
            OK_OR_CREATED,
        )
        .await
    }

    async fn charge_recurring_billing(
        &self,
        request: &RecurringChargeRequest,
    ) -> Result<RecurringChargeResponse, ApiError> {
        let path = format!("{}/{}", RECURRING_CHARGE_PATH, request.recurring_billing_id());
        self.submit(
            "charge_recurring_billing",
            &path,
            form::recurring_charge(request),
            OK_OR_CREATED,
        )
        .await
    }

    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundResponse, ApiError> {
        self.submit("create_refund", REFUND_PATH, form::refund(request), CREATED)
            .await
    }
}
