//! HitPay gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::hitpay::Credentials;
use crate::application::GatewaySettings;

/// Allowed payment link lifetime in minutes.
pub const PAYMENT_LINK_TTL_RANGE: std::ops::RangeInclusive<u32> = 5..=1000;

/// Gateway configuration (HitPay)
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// HitPay business API key
    pub api_key: SecretString,

    /// HitPay API salt used to sign notifications
    pub api_salt: SecretString,

    /// Use the live API instead of the sandbox
    #[serde(default)]
    pub live_mode: bool,

    /// Payment purpose shown to the payer
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Public origin the processor posts notifications to
    pub public_base_url: String,

    /// Payment link lifetime in minutes
    pub payment_link_ttl_minutes: Option<u32>,

    /// Payment-method slugs to offer (comma-separated)
    pub payment_methods: Option<String>,

    /// Ask the processor to email receipts
    #[serde(default)]
    pub send_email: bool,
}

impl GatewayConfig {
    /// Get payment methods as a vector
    pub fn payment_methods_list(&self) -> Vec<String> {
        self.payment_methods
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), self.api_salt.clone(), self.live_mode)
    }

    pub fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            store_name: self.store_name.clone(),
            public_base_url: self.public_base_url.clone(),
            payment_link_ttl_minutes: self.payment_link_ttl_minutes,
            payment_methods: self.payment_methods_list(),
            send_email: self.send_email,
        }
    }

    /// Validate gateway configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_KEY"));
        }
        if self.api_salt.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_SALT"));
        }

        if let Some(ttl) = self.payment_link_ttl_minutes {
            if !PAYMENT_LINK_TTL_RANGE.contains(&ttl) {
                return Err(ValidationError::InvalidPaymentLinkTtl(ttl));
            }
        }

        let url = self.public_base_url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__PUBLIC_BASE_URL"));
        }
        let https = url.starts_with("https://");
        if !https && !url.starts_with("http://") {
            return Err(ValidationError::InvalidPublicBaseUrl);
        }
        if production && !https {
            return Err(ValidationError::PublicUrlMustBeHttps);
        }

        Ok(())
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_salt", &"[REDACTED]")
            .field("live_mode", &self.live_mode)
            .field("store_name", &self.store_name)
            .field("public_base_url", &self.public_base_url)
            .field("payment_link_ttl_minutes", &self.payment_link_ttl_minutes)
            .field("payment_methods", &self.payment_methods)
            .field("send_email", &self.send_email)
            .finish()
    }
}

fn default_store_name() -> String {
    "Online Store".to_string()
}
