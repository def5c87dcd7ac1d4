//! The door state machine.
//!
//! Holds local truth for one device: a terminal state (open, closed or
//! stuck) plus an orthogonal `transitioning` flag marking an in-flight
//! command. There is no distinct opening/closing state; a transition in
//! progress is the flag layered over the prior terminal state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use gatelink_client::{ApiError, RemoteStatus};

use crate::sender::CommandSender;

/// Terminal door states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    /// Fully open.
    Open,
    /// Fully closed.
    Closed,
    /// Obstructed, or the remote reported a status we cannot interpret.
    /// Stable and recoverable: reconciliation heals it on the next
    /// unambiguous poll.
    Stuck,
}

/// Direction of a guarded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward fully open.
    Open,
    /// Toward fully closed.
    Close,
}

impl Direction {
    /// The terminal state this direction drives toward.
    pub fn target(&self) -> DoorState {
        match self {
            Direction::Open => DoorState::Open,
            Direction::Close => DoorState::Closed,
        }
    }
}

/// Door command error types.
#[derive(Debug, thiserror::Error)]
pub enum DoorError {
    /// The remote API rejected the command. Fatal per attempt: the
    /// machine is stuck and no retry is made.
    #[error("Command rejected: {0}")]
    Command(#[from] ApiError),
}

#[derive(Debug)]
struct DoorInner {
    state: DoorState,
    transitioning: bool,
    last_transition_at: DateTime<Utc>,
}

/// State machine for a single door.
pub struct DoorStateMachine {
    device_id: String,
    sender: Arc<CommandSender>,
    inner: RwLock<DoorInner>,
}

impl DoorStateMachine {
    /// Create a machine from the status reported at discovery time.
    ///
    /// Open and closed map directly; anything else starts the machine
    /// stuck, the same dispatch reconciliation applies to later polls.
    pub fn new(
        sender: Arc<CommandSender>,
        initial_status: &RemoteStatus,
        observed_at: DateTime<Utc>,
    ) -> Self {
        let state = match initial_status {
            RemoteStatus::Open => DoorState::Open,
            RemoteStatus::Closed => DoorState::Closed,
            RemoteStatus::Unrecognized(raw) => {
                warn!(
                    device_id = sender.device_id(),
                    status = raw.as_str(),
                    "cannot interpret reported status, starting stuck"
                );
                DoorState::Stuck
            }
        };
        Self {
            device_id: sender.device_id().to_string(),
            sender,
            inner: RwLock::new(DoorInner {
                state,
                transitioning: false,
                last_transition_at: observed_at,
            }),
        }
    }

    /// The device this machine tracks.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Current terminal state.
    pub async fn state(&self) -> DoorState {
        self.inner.read().await.state
    }

    /// Whether a command is in flight.
    pub async fn is_transitioning(&self) -> bool {
        self.inner.read().await.transitioning
    }

    /// Timestamp of the last transition confirmed by remote truth.
    pub async fn last_transition_at(&self) -> DateTime<Utc> {
        self.inner.read().await.last_transition_at
    }

    /// Whether a command in the given direction may be issued: the door
    /// is not already at the target and nothing is in flight.
    pub async fn can(&self, direction: Direction) -> bool {
        let inner = self.inner.read().await;
        inner.state != direction.target() && !inner.transitioning
    }

    /// Force the state to open from an authoritative remote timestamp.
    pub async fn reset_open(&self, at: DateTime<Utc>) {
        self.reset(DoorState::Open, at).await;
    }

    /// Force the state to closed from an authoritative remote timestamp.
    pub async fn reset_closed(&self, at: DateTime<Utc>) {
        self.reset(DoorState::Closed, at).await;
    }

    async fn reset(&self, state: DoorState, at: DateTime<Utc>) {
        let mut inner = self.inner.write().await;
        inner.state = state;
        inner.transitioning = false;
        inner.last_transition_at = at;
    }

    /// Force the state to stuck. Used on command failure and on
    /// unrecognized remote statuses, never as a command target.
    pub async fn mark_stuck(&self) {
        let mut inner = self.inner.write().await;
        inner.state = DoorState::Stuck;
        inner.transitioning = false;
    }

    /// Complete an optimistic transition without remote confirmation.
    ///
    /// Sets the terminal state and clears the flag but leaves
    /// `last_transition_at` alone: only remote truth advances it.
    pub async fn complete_transition(&self, state: DoorState) {
        let mut inner = self.inner.write().await;
        inner.state = state;
        inner.transitioning = false;
    }

    /// Reconcile against a polled remote status.
    ///
    /// Returns the new state when the machine moved, `None` when local
    /// and remote already agree. Idempotent by construction: a repeated
    /// identical status is a no-op.
    pub async fn apply_remote_status(
        &self,
        status: &RemoteStatus,
        at: DateTime<Utc>,
    ) -> Option<DoorState> {
        let desired = match status {
            RemoteStatus::Open => DoorState::Open,
            RemoteStatus::Closed => DoorState::Closed,
            RemoteStatus::Unrecognized(raw) => {
                let inner = self.inner.read().await;
                if inner.state != DoorState::Stuck {
                    warn!(
                        device_id = self.device_id.as_str(),
                        status = raw.as_str(),
                        "cannot interpret reported status"
                    );
                }
                DoorState::Stuck
            }
        };

        let mut inner = self.inner.write().await;
        if inner.state == desired {
            return None;
        }
        inner.state = desired;
        inner.transitioning = false;
        if desired != DoorState::Stuck {
            inner.last_transition_at = at;
        }
        Some(desired)
    }

    /// Issue an open command.
    ///
    /// The caller is expected to have checked [`Self::can`]; the machine
    /// does not re-check. On success the caller schedules confirmation;
    /// on failure the machine is stuck and the error propagates.
    pub async fn open(&self) -> Result<(), DoorError> {
        self.command(Direction::Open).await
    }

    /// Issue a close command. Same contract as [`Self::open`].
    pub async fn close(&self) -> Result<(), DoorError> {
        self.command(Direction::Close).await
    }

    async fn command(&self, direction: Direction) -> Result<(), DoorError> {
        {
            let mut inner = self.inner.write().await;
            inner.transitioning = true;
        }

        let result = match direction {
            Direction::Open => self.sender.open(None).await,
            Direction::Close => self.sender.close(None).await,
        };

        if let Err(e) = result {
            self.mark_stuck().await;
            return Err(DoorError::Command(e));
        }
        Ok(())
    }
}
