//! Configuration management for the DIVUS D+ client

pub mod credentials;

use crate::error::{DplusError, Result};
use serde::{Deserialize, Serialize};
use std::{env, time::Duration};
use url::Url;

/// D+ server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DplusConfig {
    /// D+ server URL (e.g., "http://192.168.1.100")
    pub url: Url,

    /// Connection timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Enable SSL/TLS certificate verification
    pub verify_ssl: bool,

    /// Interval between state poll cycles
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for DplusConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:80".parse().unwrap(),
            timeout: Duration::from_secs(30),
            verify_ssl: true,
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl DplusConfig {
    /// Load configuration from environment variables
    ///
    /// Supports both `DPLUS_URL` (full URL) and `DPLUS_HOST` (bare host,
    /// `http://` is prepended when the scheme is missing).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("DPLUS_URL") {
            config.url = url
                .parse()
                .map_err(|e| DplusError::config(format!("Invalid DPLUS_URL: {e}")))?;
        } else if let Ok(host) = env::var("DPLUS_HOST") {
            let url_str = if host.starts_with("http://") || host.starts_with("https://") {
                host
            } else {
                format!("http://{host}")
            };
            config.url = url_str
                .parse()
                .map_err(|e| DplusError::config(format!("Invalid DPLUS_HOST: {e}")))?;
        }

        if let Ok(timeout) = env::var("DPLUS_TIMEOUT") {
            config.timeout = Duration::from_secs(
                timeout
                    .parse()
                    .map_err(|e| DplusError::config(format!("Invalid DPLUS_TIMEOUT: {e}")))?,
            );
        }

        if let Ok(interval) = env::var("DPLUS_POLL_INTERVAL") {
            config.poll_interval = Duration::from_secs(
                interval
                    .parse()
                    .map_err(|e| DplusError::config(format!("Invalid DPLUS_POLL_INTERVAL: {e}")))?,
            );
        }

        if let Ok(verify) = env::var("DPLUS_VERIFY_SSL") {
            config.verify_ssl = verify.to_lowercase() != "false";
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.url.scheme() != "http" && self.url.scheme() != "https" {
            return Err(DplusError::config("URL must use http or https scheme"));
        }

        if self.timeout.is_zero() {
            return Err(DplusError::config("Timeout must be greater than zero"));
        }

        if self.poll_interval.is_zero() {
            return Err(DplusError::config(
                "Poll interval must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DplusConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = DplusConfig::default();

        config.url = "ftp://controller.local".parse().unwrap();
        assert!(config.validate().is_err());

        config.url = "http://controller.local".parse().unwrap();
        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config.timeout = Duration::from_secs(30);
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
