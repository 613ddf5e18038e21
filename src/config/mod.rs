//! Application configuration module
//!
//! Configuration is read from environment variables using the `config` and
//! `dotenvy` crates. Variables carry the `HITPAY_GATEWAY` prefix and nested
//! values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use hitpay_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod gateway;
mod server;

pub use error::{ConfigError, ValidationError};
pub use gateway::{GatewayConfig, PAYMENT_LINK_TTL_RANGE};
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Gateway configuration (HitPay credentials and checkout options)
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `HITPAY_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `HITPAY_GATEWAY__GATEWAY__API_KEY=...` -> `gateway.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("HITPAY_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.gateway.validate(self.is_production())?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("HITPAY_GATEWAY__GATEWAY__API_KEY", "key_test");
        env::set_var("HITPAY_GATEWAY__GATEWAY__API_SALT", "salt_test");
        env::set_var("HITPAY_GATEWAY__GATEWAY__PUBLIC_BASE_URL", "https://shop.example");
    }

    fn clear_env() {
        for key in [
            "HITPAY_GATEWAY__GATEWAY__API_KEY",
            "HITPAY_GATEWAY__GATEWAY__API_SALT",
            "HITPAY_GATEWAY__GATEWAY__PUBLIC_BASE_URL",
            "HITPAY_GATEWAY__GATEWAY__LIVE_MODE",
            "HITPAY_GATEWAY__GATEWAY__PAYMENT_LINK_TTL_MINUTES",
            "HITPAY_GATEWAY__GATEWAY__PAYMENT_METHODS",
            "HITPAY_GATEWAY__SERVER__PORT",
            "HITPAY_GATEWAY__SERVER__ENVIRONMENT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.gateway.public_base_url, "https://shop.example");
        assert!(!config.gateway.live_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_fail_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("HITPAY_GATEWAY__GATEWAY__PUBLIC_BASE_URL", "https://shop.example");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_gateway_options_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("HITPAY_GATEWAY__GATEWAY__LIVE_MODE", "true");
        env::set_var("HITPAY_GATEWAY__GATEWAY__PAYMENT_LINK_TTL_MINUTES", "30");
        env::set_var("HITPAY_GATEWAY__GATEWAY__PAYMENT_METHODS", "paynow_online,card");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.gateway.live_mode);
        assert_eq!(config.gateway.payment_link_ttl_minutes, Some(30));
        assert_eq!(
            config.gateway.payment_methods_list(),
            vec!["paynow_online", "card"]
        );
    }

    #[test]
    fn test_invalid_ttl_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("HITPAY_GATEWAY__GATEWAY__PAYMENT_LINK_TTL_MINUTES", "2");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidPaymentLinkTtl(2))
        );
    }

    #[test]
    fn test_server_defaults_and_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("HITPAY_GATEWAY__SERVER__PORT", "3000");
        env::set_var("HITPAY_GATEWAY__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
    }
}
