//! Application configuration loaded from environment variables.

use std::time::Duration;

use payments::{PayPalConfig, SANDBOX_API};

/// Signing secret used when `JWT_SECRET` is not set. Development only.
pub const DEV_JWT_SECRET: &str = "storefront-dev-secret";

/// Server configuration with sensible defaults.
///
/// Reads from environment variables (after loading an optional `.env`):
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset selects the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `JWT_SECRET`: HS256 signing secret
/// - `PAYPAL_API`, `PAYPAL_CLIENT_ID`, `PAYPAL_CLIENT_SECRET`
/// - `PAYPAL_TIMEOUT_SECS`: provider request timeout (default: `10`)
/// - `PAYMENT_VERIFY_CAPTURE`: check captures with PayPal (default: `true`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: Option<String>,
    pub paypal_api: String,
    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    pub paypal_timeout_secs: u64,
    pub verify_capture: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            eprintln!("failed to load .env: {e}");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: non_empty("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            jwt_secret: non_empty("JWT_SECRET"),
            paypal_api: non_empty("PAYPAL_API").unwrap_or(defaults.paypal_api),
            paypal_client_id: non_empty("PAYPAL_CLIENT_ID"),
            paypal_client_secret: non_empty("PAYPAL_CLIENT_SECRET"),
            paypal_timeout_secs: non_empty("PAYPAL_TIMEOUT_SECS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.paypal_timeout_secs),
            verify_capture: non_empty("PAYMENT_VERIFY_CAPTURE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.verify_capture),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the JWT secret, or the development secret if none is set.
    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEV_JWT_SECRET)
    }

    /// Settings for the PayPal client.
    pub fn paypal(&self) -> PayPalConfig {
        PayPalConfig {
            api_base: self.paypal_api.clone(),
            client_id: self.paypal_client_id.clone(),
            client_secret: self.paypal_client_secret.clone(),
            timeout: Duration::from_secs(self.paypal_timeout_secs),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 5,
            jwt_secret: None,
            paypal_api: SANDBOX_API.to_string(),
            paypal_client_id: None,
            paypal_client_secret: None,
            paypal_timeout_secs: 10,
            verify_capture: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.paypal_api, "https://api-m.sandbox.paypal.com");
        assert_eq!(config.paypal_timeout_secs, 10);
        assert!(config.verify_capture);
        assert_eq!(config.jwt_secret(), DEV_JWT_SECRET);
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", "s3cret"),
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_TIMEOUT_SECS", "3"),
            ("PAYMENT_VERIFY_CAPTURE", "false"),
        ]);

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shop")
        );
        assert_eq!(config.jwt_secret(), "s3cret");
        assert!(!config.verify_capture);

        let paypal = config.paypal();
        assert_eq!(paypal.client_id.as_deref(), Some("id"));
        assert!(paypal.client_secret.is_none());
        assert_eq!(paypal.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_blank_and_invalid_values_fall_back() {
        let config = from_pairs(&[("PORT", "not-a-port"), ("DATABASE_URL", "  ")]);
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("OFF"));
        assert!(!parse_flag("0"));
    }
}
