//! Bridge configuration.
//!
//! Configuration is loaded from a JSON file and can be overridden through
//! environment variables, so deployments on small devices don't need to
//! edit the file to rotate a token or point at a staging endpoint.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable names recognized by [`BridgeConfig::apply_env_overrides`].
pub mod env_vars {
    pub const ENDPOINT: &str = "GATELINK_ENDPOINT";
    pub const TOKEN: &str = "GATELINK_TOKEN";
    pub const POLL_INTERVAL_SECS: &str = "GATELINK_POLL_INTERVAL_SECS";
}

/// Default values shared between `Default` impls and documentation.
pub mod defaults {
    /// Production cloud endpoint.
    pub const ENDPOINT: &str = "https://api.gatelink.io/v1";
    /// Seconds between reconciliation polls.
    pub const POLL_INTERVAL_SECS: u64 = 60;
    /// Seconds before an unconfirmed command is optimistically completed.
    pub const CONFIRMATION_TIMEOUT_SECS: u64 = 12;
    /// Seconds before an HTTP request to the cloud API is abandoned.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

fn default_endpoint() -> String {
    defaults::ENDPOINT.to_string()
}

fn default_poll_interval_secs() -> u64 {
    defaults::POLL_INTERVAL_SECS
}

fn default_confirmation_timeout_secs() -> u64 {
    defaults::CONFIRMATION_TIMEOUT_SECS
}

fn default_request_timeout_secs() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}

/// Remote API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the remote device API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token used to authenticate every request.
    pub token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Remote API connection settings.
    pub api: ApiConfig,

    /// Seconds between reconciliation polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds before an unconfirmed command is optimistically completed.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Whether gate devices are exposed at all.
    #[serde(default)]
    pub include_gates: bool,

    /// Whether gates are presented as garage door openers instead of the
    /// dedicated gate accessory type.
    #[serde(default)]
    pub gates_as_garage_doors: bool,
}

impl BridgeConfig {
    /// Load configuration from a JSON file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!(
                "cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid configuration: {}", e)))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected fields from the process environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var(env_vars::ENDPOINT) {
            self.api.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var(env_vars::TOKEN) {
            self.api.token = token;
        }
        if let Ok(secs) = std::env::var(env_vars::POLL_INTERVAL_SECS) {
            if let Ok(secs) = secs.parse() {
                self.poll_interval_secs = secs;
            }
        }
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.api.token.is_empty() {
            return Err(Error::config("api.token must not be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::config("poll_interval_secs must be at least 1"));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(Error::config(
                "confirmation_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }

    /// Get the poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the confirmation timeout as a Duration.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                endpoint: defaults::ENDPOINT.to_string(),
                token: String::new(),
                request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            },
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            confirmation_timeout_secs: defaults::CONFIRMATION_TIMEOUT_SECS,
            include_gates: false,
            gates_as_garage_doors: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(12));
        assert!(!config.include_gates);
    }

    #[test]
    fn test_parse_minimal() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{"api": {"token": "secret"}}"#,
        )
        .unwrap();
        assert_eq!(config.api.endpoint, defaults::ENDPOINT);
        assert_eq!(config.api.token, "secret");
        assert_eq!(config.poll_interval_secs, 60);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = BridgeConfig::default();
        config.api.token = "secret".to_string();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api": {{"token": "secret"}}, "include_gates": true}}"#
        )
        .unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert!(config.include_gates);
        assert!(!config.gates_as_garage_doors);
    }

    #[test]
    fn test_load_missing_file() {
        let err = BridgeConfig::load("/nonexistent/bridge.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
