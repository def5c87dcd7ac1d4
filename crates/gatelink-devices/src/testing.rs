//! Test support: a scripted in-memory remote API.
//!
//! Used by the unit tests in this crate and by integration tests; not
//! intended for production code.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatelink_client::{
    ApiError, CommandMetadata, DeviceRecord, DeviceState, DeviceStateEnvelope, RemoteApi,
    RemoteStatus,
};

use crate::door::DoorStateMachine;
use crate::sender::CommandSender;

/// A command recorded by [`MockRemoteApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    Open {
        device_id: String,
        metadata: Option<CommandMetadata>,
    },
    Close {
        device_id: String,
        metadata: Option<CommandMetadata>,
    },
}

/// In-memory [`RemoteApi`] with scripted state and failure injection.
#[derive(Default)]
pub struct MockRemoteApi {
    devices: Mutex<Vec<DeviceRecord>>,
    state: Mutex<Option<DeviceState>>,
    commands: Mutex<Vec<MockCommand>>,
    poll_count: AtomicUsize,
    commands_fail: AtomicBool,
    polls_fail: AtomicBool,
}

impl MockRemoteApi {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device list returned by `get_devices`.
    pub fn set_devices(&self, devices: Vec<DeviceRecord>) {
        *self.devices.lock().unwrap() = devices;
    }

    /// Set the state returned by every subsequent `get_device_state`.
    pub fn set_state(&self, status: RemoteStatus, at: DateTime<Utc>) {
        *self.state.lock().unwrap() = Some(DeviceState {
            status,
            last_operation_at: at,
        });
    }

    /// Make open/close commands fail.
    pub fn fail_commands(&self, fail: bool) {
        self.commands_fail.store(fail, Ordering::SeqCst);
    }

    /// Make state polls fail.
    pub fn fail_polls(&self, fail: bool) {
        self.polls_fail.store(fail, Ordering::SeqCst);
    }

    /// Commands received so far.
    pub fn commands(&self) -> Vec<MockCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Number of state polls received so far.
    pub fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteApi for MockRemoteApi {
    async fn get_devices(&self) -> Result<Vec<DeviceRecord>, ApiError> {
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn get_device_state(&self, _device_id: &str) -> Result<DeviceStateEnvelope, ApiError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        if self.polls_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Request("injected poll failure".to_string()));
        }
        match self.state.lock().unwrap().clone() {
            Some(result) => Ok(DeviceStateEnvelope { result }),
            None => Err(ApiError::UnexpectedResponse("no scripted state".to_string())),
        }
    }

    async fn open(
        &self,
        device_id: &str,
        metadata: Option<&CommandMetadata>,
    ) -> Result<(), ApiError> {
        if self.commands_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Request("injected command failure".to_string()));
        }
        self.commands.lock().unwrap().push(MockCommand::Open {
            device_id: device_id.to_string(),
            metadata: metadata.cloned(),
        });
        Ok(())
    }

    async fn close(
        &self,
        device_id: &str,
        metadata: Option<&CommandMetadata>,
    ) -> Result<(), ApiError> {
        if self.commands_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Request("injected command failure".to_string()));
        }
        self.commands.lock().unwrap().push(MockCommand::Close {
            device_id: device_id.to_string(),
            metadata: metadata.cloned(),
        });
        Ok(())
    }
}

/// A timestamp at the given offset from the epoch.
pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

/// A device record with the given id and status.
pub fn record(id: &str, status: RemoteStatus) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        nickname: format!("Door {}", id),
        status,
        last_operation_at: ts(0),
        product_code: "GL-GD2".to_string(),
        device_type: Some("garage".to_string()),
    }
}

/// A state machine over a fresh mock, seeded with the given status.
pub fn machine_with_mock(status: RemoteStatus) -> (DoorStateMachine, Arc<MockRemoteApi>) {
    let api = Arc::new(MockRemoteApi::new());
    let sender = Arc::new(CommandSender::new(
        api.clone(),
        "gd-1",
        CommandMetadata {
            device_type: "garage".to_string(),
            product_code: "GL-GD2".to_string(),
        },
    ));
    (DoorStateMachine::new(sender, &status, ts(0)), api)
}
