//! Per-device command sender.
//!
//! Wraps the remote API's open/close so device-type metadata is always
//! attached. The state machine calls with no metadata and the sender
//! substitutes the defaults bound at construction, so the machine never
//! needs to know device-type specifics.

use std::sync::Arc;

use gatelink_client::{ApiError, CommandMetadata, RemoteApi};

/// Sends open/close commands for a single device.
///
/// No retries, no state: a pure decoration over the remote client.
pub struct CommandSender {
    api: Arc<dyn RemoteApi>,
    device_id: String,
    defaults: CommandMetadata,
}

impl CommandSender {
    /// Bind a sender to one device and its default metadata.
    pub fn new(api: Arc<dyn RemoteApi>, device_id: impl Into<String>, defaults: CommandMetadata) -> Self {
        Self {
            api,
            device_id: device_id.into(),
            defaults,
        }
    }

    /// The device this sender is bound to.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Send an open command, substituting default metadata if none given.
    pub async fn open(&self, metadata: Option<&CommandMetadata>) -> Result<(), ApiError> {
        self.api
            .open(&self.device_id, Some(metadata.unwrap_or(&self.defaults)))
            .await
    }

    /// Send a close command, substituting default metadata if none given.
    pub async fn close(&self, metadata: Option<&CommandMetadata>) -> Result<(), ApiError> {
        self.api
            .close(&self.device_id, Some(metadata.unwrap_or(&self.defaults)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCommand, MockRemoteApi};

    fn metadata(device_type: &str) -> CommandMetadata {
        CommandMetadata {
            device_type: device_type.to_string(),
            product_code: "GL-GD2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_defaults_substituted_when_metadata_omitted() {
        let api = Arc::new(MockRemoteApi::new());
        let sender = CommandSender::new(api.clone(), "gd-1", metadata("garage"));

        sender.open(None).await.unwrap();

        let commands = api.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0],
            MockCommand::Open {
                device_id: "gd-1".to_string(),
                metadata: Some(metadata("garage")),
            }
        );
    }

    #[tokio::test]
    async fn test_explicit_metadata_wins() {
        let api = Arc::new(MockRemoteApi::new());
        let sender = CommandSender::new(api.clone(), "gd-1", metadata("garage"));

        let override_meta = metadata("gate");
        sender.close(Some(&override_meta)).await.unwrap();

        let commands = api.commands();
        assert_eq!(
            commands[0],
            MockCommand::Close {
                device_id: "gd-1".to_string(),
                metadata: Some(override_meta),
            }
        );
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let api = Arc::new(MockRemoteApi::new());
        api.fail_commands(true);
        let sender = CommandSender::new(api, "gd-1", metadata("garage"));

        assert!(sender.open(None).await.is_err());
    }
}
