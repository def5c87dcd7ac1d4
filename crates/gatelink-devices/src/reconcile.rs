//! Periodic reconciliation against remote truth.
//!
//! A recurring task polls the remote status for one device and forces the
//! state machine back into agreement whenever it has drifted. Drift is
//! not an error: it is corrected silently. The loop never overrides an
//! in-flight command; its only job during a transition is resolving the
//! pending confirmation when the poll observes the expected status.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gatelink_client::RemoteApi;

use crate::accessory::CurrentDoorState;
use crate::confirm::ConfirmationTracker;
use crate::door::{DoorState, DoorStateMachine};

/// Reconciliation task for a single device.
///
/// Created by the accessory and started explicitly; nothing starts
/// ticking as a side effect of construction.
#[derive(Clone)]
pub struct ReconcileLoop {
    api: Arc<dyn RemoteApi>,
    machine: Arc<DoorStateMachine>,
    confirmations: Arc<ConfirmationTracker>,
    signal: watch::Sender<CurrentDoorState>,
    period: Duration,
    running: Arc<RwLock<bool>>,
}

impl ReconcileLoop {
    /// Create a loop over the given machine and confirmation tracker.
    pub fn new(
        api: Arc<dyn RemoteApi>,
        machine: Arc<DoorStateMachine>,
        confirmations: Arc<ConfirmationTracker>,
        signal: watch::Sender<CurrentDoorState>,
        period: Duration,
    ) -> Self {
        Self {
            api,
            machine,
            confirmations,
            signal,
            period,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the recurring task. Returns its handle; the owner stops it
    /// via [`Self::stop`] and may abort the handle on shutdown.
    pub async fn start(&self) -> JoinHandle<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                return tokio::spawn(async move {});
            }
            *running = true;
        }

        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(this.period);
            // The first tick fires immediately; discovery already seeded
            // the machine, so skip it.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !*this.running.read().await {
                    break;
                }
                this.run_once().await;
            }
        })
    }

    /// Stop the recurring task after its current tick.
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    /// One reconciliation pass.
    pub async fn run_once(&self) {
        let device_id = self.machine.device_id();

        // An in-flight command owns the state until it is confirmed or
        // fails; without a confirmation to resolve there is nothing to
        // poll for.
        let awaiting = self.confirmations.is_pending().await;
        if self.machine.is_transitioning().await && !awaiting {
            debug!(device_id, "transition in flight, skipping reconciliation");
            return;
        }

        let envelope = match self.api.get_device_state(device_id).await {
            Ok(envelope) => envelope,
            Err(gatelink_client::ApiError::UnexpectedResponse(msg)) => {
                // The API answered but we cannot interpret what it said;
                // that is a stuck door, not a skipped poll.
                if self.machine.is_transitioning().await {
                    return;
                }
                warn!(device_id, error = msg.as_str(), "cannot interpret device state");
                if self.machine.state().await != DoorState::Stuck {
                    self.machine.mark_stuck().await;
                    self.signal.send_replace(CurrentDoorState::Stopped);
                }
                return;
            }
            Err(e) => {
                warn!(device_id, error = %e, "status poll failed, skipping");
                return;
            }
        };
        let status = envelope.result.status;
        let at = envelope.result.last_operation_at;

        if let Some(confirmed) = self.confirmations.try_resolve(&status, at).await {
            debug!(device_id, state = ?confirmed, "command confirmed by poll");
            return;
        }

        // A command may have started while the poll was in flight; leave
        // its outcome to the confirmation path on a later tick.
        if self.machine.is_transitioning().await {
            debug!(device_id, "transition started mid-poll, discarding result");
            return;
        }

        if let Some(corrected) = self.machine.apply_remote_status(&status, at).await {
            info!(device_id, state = ?corrected, remote = %status, "reconciled to remote truth");
            self.signal.send_replace(CurrentDoorState::from(corrected));
        }
    }
}
