//! Optimistic transition confirmation.
//!
//! After a command is accepted, the accessory registers a pending
//! confirmation here. The reconcile loop resolves it when a poll observes
//! the expected terminal status, carrying the authoritative remote
//! timestamp; if no poll confirms in time, the accessory's fallback
//! timeout completes the transition optimistically instead.

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, Mutex};

use gatelink_client::RemoteStatus;

use crate::door::DoorState;

struct Pending {
    expected: DoorState,
    tx: oneshot::Sender<DateTime<Utc>>,
}

/// Tracks at most one pending confirmation per device.
///
/// The `transitioning` guard on the state machine means a second command
/// cannot start while one is outstanding, so a single slot suffices.
#[derive(Default)]
pub struct ConfirmationTracker {
    slot: Mutex<Option<Pending>>,
}

impl ConfirmationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending confirmation for the expected terminal state.
    ///
    /// Returns the receiver resolved with the remote timestamp when a
    /// poll observes the expected status. Replaces any stale previous
    /// registration.
    pub async fn register(&self, expected: DoorState) -> oneshot::Receiver<DateTime<Utc>> {
        let (tx, rx) = oneshot::channel();
        *self.slot.lock().await = Some(Pending { expected, tx });
        rx
    }

    /// Whether a confirmation is outstanding.
    pub async fn is_pending(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Drop the pending confirmation without resolving it. Called by the
    /// fallback timeout path once it has completed the transition itself.
    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }

    /// Resolve the pending confirmation if the polled status matches the
    /// expected terminal state. Returns the state that was confirmed.
    pub async fn try_resolve(
        &self,
        status: &RemoteStatus,
        at: DateTime<Utc>,
    ) -> Option<DoorState> {
        let mut slot = self.slot.lock().await;
        let matches = match (&*slot, status) {
            (Some(pending), RemoteStatus::Open) => pending.expected == DoorState::Open,
            (Some(pending), RemoteStatus::Closed) => pending.expected == DoorState::Closed,
            _ => false,
        };
        if !matches {
            return None;
        }
        let pending = slot.take()?;
        // The receiver may already be gone if the fallback fired first.
        let _ = pending.tx.send(at);
        Some(pending.expected)
    }
}
