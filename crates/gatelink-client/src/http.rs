//! HTTP implementation of the remote device API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiError, RemoteApi};
use crate::types::{CommandMetadata, DeviceRecord, DeviceStateEnvelope};

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpApiConfig {
    /// Base URL of the remote API, without a trailing slash.
    pub endpoint: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl HttpApiConfig {
    /// Create a config for the given endpoint and token.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            endpoint,
            token: token.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Get the timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl From<&gatelink_core::config::ApiConfig> for HttpApiConfig {
    fn from(config: &gatelink_core::config::ApiConfig) -> Self {
        Self::new(config.endpoint.clone(), config.token.clone())
            .with_timeout_secs(config.request_timeout_secs)
    }
}

/// Remote device API over HTTPS JSON.
pub struct HttpRemoteApi {
    config: HttpApiConfig,
    client: Client,
}

impl HttpRemoteApi {
    /// Create a new HTTP client.
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint, path)
    }

    fn map_status(status: StatusCode, device_id: Option<&str>) -> Option<ApiError> {
        match status {
            s if s.is_success() => None,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Some(ApiError::DeviceNotFound(
                device_id.unwrap_or("unknown").to_string(),
            )),
            s => Some(ApiError::Request(format!("HTTP {}", s))),
        }
    }

    fn map_transport(e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e.to_string())
        }
    }

    async fn send_command(
        &self,
        device_id: &str,
        action: &str,
        metadata: Option<&CommandMetadata>,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/devices/{}/{}", device_id, action));
        debug!(device_id, action, "sending door command");

        let mut request = self.client.put(&url).bearer_auth(&self.config.token);
        if let Some(metadata) = metadata {
            request = request.json(metadata);
        }

        let response = request.send().await.map_err(Self::map_transport)?;
        if let Some(err) = Self::map_status(response.status(), Some(device_id)) {
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn get_devices(&self) -> Result<Vec<DeviceRecord>, ApiError> {
        let response = self
            .client
            .get(self.url("/devices"))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(Self::map_transport)?;
        if let Some(err) = Self::map_status(response.status(), None) {
            return Err(err);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::UnexpectedResponse(e.to_string()))
    }

    async fn get_device_state(&self, device_id: &str) -> Result<DeviceStateEnvelope, ApiError> {
        let url = self.url(&format!("/devices/{}/state", device_id));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(Self::map_transport)?;
        if let Some(err) = Self::map_status(response.status(), Some(device_id)) {
            return Err(err);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::UnexpectedResponse(e.to_string()))
    }

    async fn open(
        &self,
        device_id: &str,
        metadata: Option<&CommandMetadata>,
    ) -> Result<(), ApiError> {
        self.send_command(device_id, "open", metadata).await
    }

    async fn close(
        &self,
        device_id: &str,
        metadata: Option<&CommandMetadata>,
    ) -> Result<(), ApiError> {
        self.send_command(device_id, "close", metadata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_strips_trailing_slash() {
        let config = HttpApiConfig::new("https://api.example.com/v1/", "token");
        assert_eq!(config.endpoint, "https://api.example.com/v1");
    }

    #[test]
    fn test_url_building() {
        let api =
            HttpRemoteApi::new(HttpApiConfig::new("https://api.example.com/v1", "token")).unwrap();
        assert_eq!(
            api.url("/devices/gd-1/state"),
            "https://api.example.com/v1/devices/gd-1/state"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(HttpRemoteApi::map_status(StatusCode::OK, None).is_none());
        assert!(matches!(
            HttpRemoteApi::map_status(StatusCode::UNAUTHORIZED, None),
            Some(ApiError::Unauthorized)
        ));
        assert!(matches!(
            HttpRemoteApi::map_status(StatusCode::NOT_FOUND, Some("gd-1")),
            Some(ApiError::DeviceNotFound(id)) if id == "gd-1"
        ));
        assert!(matches!(
            HttpRemoteApi::map_status(StatusCode::BAD_GATEWAY, None),
            Some(ApiError::Request(_))
        ));
    }
}
