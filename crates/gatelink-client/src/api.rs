//! The remote device API surface consumed by the device layer.

use async_trait::async_trait;

use crate::types::{CommandMetadata, DeviceRecord, DeviceStateEnvelope};

/// Remote API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication rejected")]
    Unauthorized,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<ApiError> for gatelink_core::Error {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Timeout => gatelink_core::Error::timeout("remote API request"),
            ApiError::DeviceNotFound(id) => gatelink_core::Error::not_found(id),
            other => gatelink_core::Error::api(other.to_string()),
        }
    }
}

/// The remote device API.
///
/// Command calls resolve when the API accepts the command, which is well
/// before the physical door finishes moving. Callers own the optimistic
/// bookkeeping for that gap.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List all devices on the account.
    async fn get_devices(&self) -> Result<Vec<DeviceRecord>, ApiError>;

    /// Query the current state of one device.
    async fn get_device_state(&self, device_id: &str) -> Result<DeviceStateEnvelope, ApiError>;

    /// Ask the device to open.
    async fn open(
        &self,
        device_id: &str,
        metadata: Option<&CommandMetadata>,
    ) -> Result<(), ApiError>;

    /// Ask the device to close.
    async fn close(
        &self,
        device_id: &str,
        metadata: Option<&CommandMetadata>,
    ) -> Result<(), ApiError>;
}
