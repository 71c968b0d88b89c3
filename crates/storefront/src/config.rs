//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8080)
//! - `STOREFRONT_COOKIE_SECURE` - Mark auth cookies `Secure` (default: true)
//! - `STOREFRONT_SESSION_TTL_HOURS` - Session lifetime (default: 24)
//! - `STOREFRONT_SESSION_SWEEP_SECS` - Expired-session sweep interval (default: 300)
//! - `STOREFRONT_PASSWORD_MEMORY_KIB` - Argon2 memory cost (default: 19456)
//! - `STOREFRONT_PASSWORD_ITERATIONS` - Argon2 passes (default: 2)
//! - `STOREFRONT_CURRENCY` - Catalog currency, BRL/USD/EUR (default: BRL)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use secrecy::SecretString;
use thiserror::Error;

use urbancart_core::CurrencyCode;

use crate::services::auth::HashCost;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Whether auth cookies carry the `Secure` attribute
    pub cookie_secure: bool,
    /// Lifetime of a login session and its cookies
    pub session_ttl: TimeDelta,
    /// How often expired sessions are swept
    pub sweep_interval: Duration,
    /// Argon2id cost for password hashes
    pub password_cost: HashCost,
    /// Currency catalog prices are expressed in
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            cookie_secure: true,
            session_ttl: TimeDelta::hours(24),
            sweep_interval: Duration::from_secs(300),
            password_cost: HashCost::default(),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let ttl_hours: i64 = parse_or(&get, "STOREFRONT_SESSION_TTL_HOURS", 24)?;
        let session_ttl = TimeDelta::try_hours(ttl_hours)
            .filter(|ttl| *ttl > TimeDelta::zero())
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "STOREFRONT_SESSION_TTL_HOURS".to_string(),
                    format!("must be a positive number of hours (got {ttl_hours})"),
                )
            })?;

        let sweep_secs: u64 = parse_or(&get, "STOREFRONT_SESSION_SWEEP_SECS", 300)?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_SESSION_SWEEP_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let password_cost = HashCost::new(
            parse_or(
                &get,
                "STOREFRONT_PASSWORD_MEMORY_KIB",
                defaults.password_cost.memory_kib,
            )?,
            parse_or(
                &get,
                "STOREFRONT_PASSWORD_ITERATIONS",
                defaults.password_cost.iterations,
            )?,
        );
        // Reject bad Argon2 parameters at startup rather than on first register
        password_cost.hasher().map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_PASSWORD_MEMORY_KIB".to_string(), e.to_string())
        })?;

        Ok(Self {
            host: parse_or(&get, "STOREFRONT_HOST", defaults.host)?,
            port: parse_or(&get, "STOREFRONT_PORT", defaults.port)?,
            cookie_secure: parse_or(&get, "STOREFRONT_COOKIE_SECURE", defaults.cookie_secure)?,
            session_ttl,
            sweep_interval: Duration::from_secs(sweep_secs),
            password_cost,
            currency: parse_or(&get, "STOREFRONT_CURRENCY", defaults.currency)?,
            sentry_dsn: get("SENTRY_DSN")
                .filter(|dsn| !dsn.is_empty())
                .map(SecretString::from),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an environment variable, falling back to `default` when unset.
fn parse_or<T>(get: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert!(config.cookie_secure);
        assert_eq!(config.session_ttl, TimeDelta::hours(24));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.password_cost, HashCost::default());
        assert_eq!(config.currency, CurrencyCode::BRL);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "3000"),
            ("STOREFRONT_COOKIE_SECURE", "false"),
            ("STOREFRONT_SESSION_TTL_HOURS", "2"),
            ("STOREFRONT_CURRENCY", "usd"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
        assert!(!config.cookie_secure);
        assert_eq!(config.session_ttl, TimeDelta::hours(2));
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(
            config.sentry_dsn.unwrap().expose_secret(),
            "https://key@sentry.example/1"
        );
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = load(&[("STOREFRONT_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_PORT"));

        assert!(load(&[("STOREFRONT_SESSION_TTL_HOURS", "0")]).is_err());
        assert!(load(&[("STOREFRONT_SESSION_SWEEP_SECS", "0")]).is_err());
        assert!(load(&[("STOREFRONT_CURRENCY", "JPY")]).is_err());
        assert!(load(&[("STOREFRONT_PASSWORD_MEMORY_KIB", "1")]).is_err());
    }

    #[test]
    fn test_empty_sentry_dsn_is_disabled() {
        let config = load(&[("SENTRY_DSN", "")]).unwrap();
        assert!(config.sentry_dsn.is_none());
    }
}
