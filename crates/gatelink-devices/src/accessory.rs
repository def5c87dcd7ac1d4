//! The host-facing door accessory.
//!
//! Ties one device's state machine, confirmation tracking and
//! reconciliation loop together and exposes the three characteristics
//! the host platform binds to: current door state, target door state and
//! obstruction detection. Command failures are absorbed here; nothing is
//! ever propagated up to the platform.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use gatelink_client::{DeviceRecord, RemoteApi, RemoteStatus};
use gatelink_core::BridgeConfig;

use crate::confirm::ConfirmationTracker;
use crate::door::{Direction, DoorState, DoorStateMachine};
use crate::kind::DeviceKind;
use crate::reconcile::ReconcileLoop;
use crate::sender::CommandSender;

/// Externally observable door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentDoorState {
    Open,
    Opening,
    Closed,
    Closing,
    Stopped,
}

impl From<DoorState> for CurrentDoorState {
    fn from(state: DoorState) -> Self {
        match state {
            DoorState::Open => CurrentDoorState::Open,
            DoorState::Closed => CurrentDoorState::Closed,
            DoorState::Stuck => CurrentDoorState::Stopped,
        }
    }
}

/// Writable target door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDoorState {
    Open,
    Closed,
}

impl TargetDoorState {
    fn direction(self) -> Direction {
        match self {
            TargetDoorState::Open => Direction::Open,
            TargetDoorState::Closed => Direction::Close,
        }
    }
}

/// How the accessory is presented to the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessoryCategory {
    GarageDoorOpener,
    Gate,
}

/// A single door exposed to the host platform.
pub struct DoorAccessory {
    name: String,
    kind: DeviceKind,
    category: AccessoryCategory,
    machine: Arc<DoorStateMachine>,
    confirmations: Arc<ConfirmationTracker>,
    signal: watch::Sender<CurrentDoorState>,
    reconcile: ReconcileLoop,
    confirmation_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DoorAccessory {
    /// Build an accessory for a discovered device.
    ///
    /// The machine is seeded from the record's reported status; the
    /// reconciliation loop is created but not started.
    pub fn new(record: &DeviceRecord, api: Arc<dyn RemoteApi>, config: &BridgeConfig) -> Self {
        let kind = DeviceKind::classify(record);
        let category = if kind.is_gate() && !config.gates_as_garage_doors {
            AccessoryCategory::Gate
        } else {
            AccessoryCategory::GarageDoorOpener
        };

        let sender = Arc::new(CommandSender::new(
            api.clone(),
            record.id.clone(),
            kind.metadata(),
        ));
        let machine = Arc::new(DoorStateMachine::new(
            sender,
            &record.status,
            record.last_operation_at,
        ));
        let confirmations = Arc::new(ConfirmationTracker::new());

        let initial = match record.status {
            RemoteStatus::Open => CurrentDoorState::Open,
            RemoteStatus::Closed => CurrentDoorState::Closed,
            RemoteStatus::Unrecognized(_) => CurrentDoorState::Stopped,
        };
        let (signal, _) = watch::channel(initial);

        let reconcile = ReconcileLoop::new(
            api,
            machine.clone(),
            confirmations.clone(),
            signal.clone(),
            config.poll_interval(),
        );

        Self {
            name: record.nickname.clone(),
            kind,
            category,
            machine,
            confirmations,
            signal,
            reconcile,
            confirmation_timeout: config.confirmation_timeout(),
            task: Mutex::new(None),
        }
    }

    /// Display name of the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device kind.
    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Presentation category.
    pub fn category(&self) -> AccessoryCategory {
        self.category
    }

    /// The underlying state machine.
    pub fn machine(&self) -> &Arc<DoorStateMachine> {
        &self.machine
    }

    /// Start the reconciliation loop.
    pub async fn start(&self) {
        let handle = self.reconcile.start().await;
        *self.task.lock().await = Some(handle);
        info!(device = self.name.as_str(), "accessory started");
    }

    /// Stop the reconciliation loop.
    pub async fn stop(&self) {
        self.reconcile.stop().await;
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
        info!(device = self.name.as_str(), "accessory stopped");
    }

    /// Current externally observable state.
    pub fn current_door_state(&self) -> CurrentDoorState {
        *self.signal.borrow()
    }

    /// Subscribe to state signal changes.
    pub fn subscribe(&self) -> watch::Receiver<CurrentDoorState> {
        self.signal.subscribe()
    }

    /// Last accepted target, derived from the observable state.
    pub fn target_door_state(&self) -> TargetDoorState {
        match self.current_door_state() {
            CurrentDoorState::Open | CurrentDoorState::Opening => TargetDoorState::Open,
            _ => TargetDoorState::Closed,
        }
    }

    /// Whether the door is obstructed (stuck).
    pub async fn obstruction_detected(&self) -> bool {
        self.machine.state().await == DoorState::Stuck
    }

    /// Handle a target door state write from the host platform.
    ///
    /// Guard rejections are silent no-ops; command failures degrade the
    /// door to stuck and the signal to stopped, and are never returned.
    pub async fn set_target_door_state(&self, target: TargetDoorState) {
        let device_id = self.machine.device_id();
        let direction = target.direction();

        if !self.machine.can(direction).await {
            debug!(device_id, ?target, "target rejected by guard");
            return;
        }

        self.signal.send_replace(match target {
            TargetDoorState::Open => CurrentDoorState::Opening,
            TargetDoorState::Closed => CurrentDoorState::Closing,
        });

        let result = match direction {
            Direction::Open => self.machine.open().await,
            Direction::Close => self.machine.close().await,
        };

        match result {
            Ok(()) => {
                debug!(device_id, ?target, "command accepted, awaiting confirmation");
                self.schedule_confirmation(direction.target()).await;
            }
            Err(e) => {
                error!(device_id, error = %e, "command failed, door stuck");
                self.signal.send_replace(CurrentDoorState::Stopped);
            }
        }
    }

    /// Register a pending confirmation and spawn the wait for it.
    ///
    /// The primary resolution is the next reconciliation poll observing
    /// the expected status; the timeout is the optimistic fallback. Once
    /// scheduled, neither can be cancelled.
    async fn schedule_confirmation(&self, expected: DoorState) {
        let rx = self.confirmations.register(expected).await;

        let machine = self.machine.clone();
        let confirmations = self.confirmations.clone();
        let signal = self.signal.clone();
        let timeout = self.confirmation_timeout;

        tokio::spawn(async move {
            tokio::select! {
                confirmed = rx => {
                    if let Ok(at) = confirmed {
                        match expected {
                            DoorState::Open => machine.reset_open(at).await,
                            _ => machine.reset_closed(at).await,
                        }
                    }
                    signal.send_replace(CurrentDoorState::from(expected));
                }
                _ = tokio::time::sleep(timeout) => {
                    // Assume the physical action completed; if it did
                    // not, the next reconciliation poll corrects it.
                    confirmations.clear().await;
                    machine.complete_transition(expected).await;
                    signal.send_replace(CurrentDoorState::from(expected));
                }
            }
        });
    }
}
