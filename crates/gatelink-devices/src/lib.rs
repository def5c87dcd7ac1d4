//! State reconciliation core for GateLink.
//!
//! Each discovered door gets a [`DoorStateMachine`] holding local truth, a
//! [`CommandSender`] bound to its metadata, and a [`ReconcileLoop`] that
//! periodically forces the machine back into agreement with the remote
//! API. Optimistic commands are confirmed by the next poll that observes
//! the expected terminal status, with a fixed timeout as the fallback
//! upper bound.

pub mod accessory;
pub mod confirm;
pub mod discovery;
pub mod door;
pub mod kind;
pub mod reconcile;
pub mod sender;
pub mod testing;

pub use accessory::{AccessoryCategory, CurrentDoorState, DoorAccessory, TargetDoorState};
pub use confirm::ConfirmationTracker;
pub use discovery::discover;
pub use door::{Direction, DoorError, DoorState, DoorStateMachine};
pub use kind::DeviceKind;
pub use reconcile::ReconcileLoop;
pub use sender::CommandSender;
