//! Application configuration management.
//!
//! Loaded from environment variables with `envy`. Gateway credentials are
//! deliberately absent: they arrive with each transaction request.

use std::time::Duration;

use serde::Deserialize;

/// Accepted range for `GATEWAY_TIMEOUT_SECS`.
pub const GATEWAY_TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 30..=45;

/// Production commit endpoint of the gateway.
pub const DEFAULT_GATEWAY_URL: &str =
    "https://pci.zcredit.co.il/ZCreditWS/api/Transaction/CommitFullTransaction";

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `GATEWAY_URL` (optional): gateway commit endpoint
/// - `GATEWAY_TIMEOUT_SECS` (optional): bound on one gateway call, 30 to 45,
///   defaults to 30
/// - `DATABASE_URL` (optional): PostgreSQL connection string; records are kept
///   in memory when unset
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,

    pub database_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid GATEWAY_URL {url}: {reason}")]
    InvalidGatewayUrl { url: String, reason: String },

    #[error("GATEWAY_TIMEOUT_SECS must be between 30 and 45, got {0}")]
    InvalidTimeout(u64),
}

fn default_port() -> u16 {
    3000
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_gateway_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed, the gateway URL is not
    /// an http(s) URL, or the timeout is outside 30 to 45 seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()?.validated()
    }

    /// Load configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)?.validated()
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let parsed = url::Url::parse(&self.gateway_url).map_err(|e| {
            ConfigError::InvalidGatewayUrl {
                url: self.gateway_url.clone(),
                reason: e.to_string(),
            }
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidGatewayUrl {
                url: self.gateway_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        if !GATEWAY_TIMEOUT_RANGE_SECS.contains(&self.gateway_timeout_secs) {
            return Err(ConfigError::InvalidTimeout(self.gateway_timeout_secs));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.gateway_timeout(), Duration::from_secs(30));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("SERVER_PORT", "8080"),
            ("GATEWAY_URL", "http://localhost:8080/sandbox/gateway"),
            ("GATEWAY_TIMEOUT_SECS", "45"),
            ("DATABASE_URL", "postgres://localhost/payments"),
        ]))
        .unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.gateway_timeout(), Duration::from_secs(45));
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/payments")
        );
    }

    #[test]
    fn test_rejects_bad_gateway_url() {
        let err = Config::from_vars(vars(&[("GATEWAY_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGatewayUrl { .. }));

        let err = Config::from_vars(vars(&[("GATEWAY_URL", "ftp://example.com/x")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGatewayUrl { .. }));
    }

    #[test]
    fn test_timeout_outside_window_rejected() {
        for secs in ["0", "1", "29", "46", "3600"] {
            let err = Config::from_vars(vars(&[("GATEWAY_TIMEOUT_SECS", secs)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout(_)), "{secs}");
        }

        for secs in ["30", "45"] {
            assert!(Config::from_vars(vars(&[("GATEWAY_TIMEOUT_SECS", secs)])).is_ok());
        }
    }
}
