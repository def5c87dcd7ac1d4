//! Core types for GateLink.
//!
//! This crate defines the unified error type and the bridge configuration
//! shared by every other crate in the workspace.

pub mod config;
pub mod error;

pub use config::BridgeConfig;
pub use error::{Error, Result};
