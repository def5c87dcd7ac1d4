//! End-to-end accessory behavior: optimistic commands, confirmation by
//! poll, fallback timeout, and absorbed failures.

use std::sync::Arc;
use std::time::Duration;

use gatelink_client::RemoteStatus;
use gatelink_core::BridgeConfig;
use gatelink_devices::testing::{record, ts, MockRemoteApi};
use gatelink_devices::{CurrentDoorState, DoorAccessory, DoorState, TargetDoorState};

fn accessory_with(
    status: RemoteStatus,
    config: &BridgeConfig,
) -> (DoorAccessory, Arc<MockRemoteApi>) {
    let api = Arc::new(MockRemoteApi::new());
    let accessory = DoorAccessory::new(&record("gd-1", status), api.clone(), config);
    (accessory, api)
}

fn accessory(status: RemoteStatus) -> (DoorAccessory, Arc<MockRemoteApi>) {
    accessory_with(status, &BridgeConfig::default())
}

#[tokio::test(start_paused = true)]
async fn open_is_optimistically_confirmed_after_timeout() {
    let (accessory, api) = accessory(RemoteStatus::Closed);

    accessory.set_target_door_state(TargetDoorState::Open).await;

    // Transitioning immediately, signal shows movement.
    assert!(accessory.machine().is_transitioning().await);
    assert_eq!(accessory.current_door_state(), CurrentDoorState::Opening);
    assert_eq!(api.commands().len(), 1);

    // No poll ever confirms; the fixed timeout advances the signal
    // unconditionally.
    tokio::time::sleep(Duration::from_secs(13)).await;

    assert_eq!(accessory.current_door_state(), CurrentDoorState::Open);
    assert_eq!(accessory.machine().state().await, DoorState::Open);
    assert!(!accessory.machine().is_transitioning().await);
    // Optimistic completion never advances the confirmed timestamp.
    assert_eq!(accessory.machine().last_transition_at().await, ts(0));
}

#[tokio::test(start_paused = true)]
async fn failed_open_is_absorbed_as_stuck_and_stopped() {
    let (accessory, api) = accessory(RemoteStatus::Closed);
    api.fail_commands(true);

    accessory.set_target_door_state(TargetDoorState::Open).await;

    assert_eq!(accessory.machine().state().await, DoorState::Stuck);
    assert!(!accessory.machine().is_transitioning().await);
    assert_eq!(accessory.current_door_state(), CurrentDoorState::Stopped);
    assert!(accessory.obstruction_detected().await);
}

#[tokio::test(start_paused = true)]
async fn guard_rejects_redundant_target() {
    let (accessory, api) = accessory(RemoteStatus::Open);

    // Already open: the write is a silent no-op.
    accessory.set_target_door_state(TargetDoorState::Open).await;

    assert!(api.commands().is_empty());
    assert_eq!(accessory.current_door_state(), CurrentDoorState::Open);
    assert!(!accessory.machine().is_transitioning().await);
}

#[tokio::test(start_paused = true)]
async fn guard_rejects_while_transitioning() {
    let (accessory, api) = accessory(RemoteStatus::Closed);

    accessory.set_target_door_state(TargetDoorState::Open).await;
    accessory.set_target_door_state(TargetDoorState::Closed).await;

    // Only the first command went out.
    assert_eq!(api.commands().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_confirms_before_fallback_timeout() {
    // Long fallback so the reconciliation poll wins the race.
    let mut config = BridgeConfig::default();
    config.confirmation_timeout_secs = 300;
    let (accessory, api) = accessory_with(RemoteStatus::Closed, &config);

    accessory.start().await;
    accessory.set_target_door_state(TargetDoorState::Open).await;
    assert!(accessory.machine().is_transitioning().await);

    // The next poll observes the door open with an authoritative
    // timestamp.
    api.set_state(RemoteStatus::Open, ts(900));
    tokio::time::sleep(Duration::from_secs(61)).await;
    tokio::task::yield_now().await;

    assert_eq!(accessory.current_door_state(), CurrentDoorState::Open);
    assert_eq!(accessory.machine().state().await, DoorState::Open);
    assert!(!accessory.machine().is_transitioning().await);
    // Poll-confirmed transitions carry the remote timestamp.
    assert_eq!(accessory.machine().last_transition_at().await, ts(900));

    accessory.stop().await;
}

#[tokio::test(start_paused = true)]
async fn reconciliation_corrects_drift_while_running() {
    let (accessory, api) = accessory(RemoteStatus::Open);

    accessory.start().await;
    api.set_state(RemoteStatus::Closed, ts(1000));
    tokio::time::sleep(Duration::from_secs(61)).await;
    tokio::task::yield_now().await;

    assert_eq!(accessory.machine().state().await, DoorState::Closed);
    assert_eq!(accessory.current_door_state(), CurrentDoorState::Closed);
    assert_eq!(accessory.machine().last_transition_at().await, ts(1000));

    accessory.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unrecognized_record_status_starts_stuck() {
    let (accessory, _api) = accessory(RemoteStatus::Unrecognized("ajar".to_string()));

    assert_eq!(accessory.machine().state().await, DoorState::Stuck);
    assert_eq!(accessory.current_door_state(), CurrentDoorState::Stopped);
    assert!(accessory.obstruction_detected().await);
}

#[tokio::test(start_paused = true)]
async fn stuck_door_recovers_and_can_be_commanded() {
    let (accessory, api) = accessory(RemoteStatus::Unrecognized("ajar".to_string()));

    accessory.start().await;
    api.set_state(RemoteStatus::Closed, ts(500));
    tokio::time::sleep(Duration::from_secs(61)).await;
    tokio::task::yield_now().await;

    assert_eq!(accessory.machine().state().await, DoorState::Closed);
    assert!(!accessory.obstruction_detected().await);

    accessory.set_target_door_state(TargetDoorState::Open).await;
    assert_eq!(api.commands().len(), 1);

    accessory.stop().await;
}
