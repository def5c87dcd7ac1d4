//! Remote device API client for GateLink.
//!
//! Defines the wire types reported by the cloud API, the [`RemoteApi`]
//! trait consumed by the device layer, and the HTTP implementation.

pub mod api;
pub mod http;
pub mod types;

pub use api::{ApiError, RemoteApi};
pub use http::{HttpApiConfig, HttpRemoteApi};
pub use types::{CommandMetadata, DeviceRecord, DeviceState, DeviceStateEnvelope, RemoteStatus};
