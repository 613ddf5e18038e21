//! HitPay HTTP client.
//!
//! Holds the merchant credentials and issues form-encoded `POST`s against the
//! live or sandbox API. One attempt per call, bounded by a fixed timeout.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::payment::SignatureVerifier;
use crate::ports::ApiError;

/// Live API base URL.
pub const LIVE_BASE_URL: &str = "https://api.hit-pay.com/v1/";

/// Sandbox API base URL.
pub const SANDBOX_BASE_URL: &str = "https://api.sandbox.hit-pay.com/v1/";

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const API_KEY_HEADER: &str = "x-business-api-key";
const REQUESTED_WITH_HEADER: &str = "x-requested-with";

/// Merchant credentials and mode.
#[derive(Clone)]
pub struct Credentials {
    api_key: SecretString,
    api_salt: SecretString,
    live_mode: bool,
}

impl Credentials {
    pub fn new(api_key: SecretString, api_salt: SecretString, live_mode: bool) -> Self {
        Self {
            api_key,
            api_salt,
            live_mode,
        }
    }

    /// Notification verifier keyed by the API salt.
    pub fn verifier(&self) -> SignatureVerifier {
        SignatureVerifier::new(self.api_salt.clone())
    }

    pub fn live_mode(&self) -> bool {
        self.live_mode
    }

    /// Base URL selected by the mode.
    pub fn base_url(&self) -> &'static str {
        if self.live_mode {
            LIVE_BASE_URL
        } else {
            SANDBOX_BASE_URL
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_salt", &"[REDACTED]")
            .field("live_mode", &self.live_mode)
            .finish()
    }
}

/// Raw processor response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Form-posting HTTP client bound to one set of credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client with the API key and marker headers set on every request.
    pub fn new(credentials: &Credentials) -> Result<Self, ApiError> {
        let mut api_key = HeaderValue::from_str(credentials.api_key.expose_secret())
            .map_err(|_| ApiError::invalid_request("API key is not a valid header value"))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(REQUESTED_WITH_HEADER, HeaderValue::from_static("XMLHttpRequest"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: credentials.base_url().to_string(),
        })
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts a form body to a path relative to the base URL.
    ///
    /// Any HTTP status is returned as a response; only network failures and
    /// timeouts are errors.
    pub async fn post(&self, path: &str, form: &[(String, String)]) -> Result<RawResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(path = %path, timeout = e.is_timeout(), error = %e, "HitPay request failed");
                ApiError::transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(format!("failed to read response body: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}
