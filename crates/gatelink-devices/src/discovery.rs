//! Device discovery.
//!
//! Turns the remote device list into accessories, applying the
//! configuration switches for the secondary gate category.

use std::sync::Arc;

use tracing::{debug, info};

use gatelink_client::RemoteApi;
use gatelink_core::{BridgeConfig, Result};

use crate::accessory::DoorAccessory;
use crate::kind::DeviceKind;

/// Fetch the device list and build one accessory per exposed device.
///
/// Gates are skipped entirely unless `include_gates` is set; their
/// presentation category is decided by `gates_as_garage_doors`.
pub async fn discover(
    api: Arc<dyn RemoteApi>,
    config: &BridgeConfig,
) -> Result<Vec<DoorAccessory>> {
    let records = api.get_devices().await.map_err(gatelink_core::Error::from)?;

    let mut accessories = Vec::new();
    for record in records {
        let kind = DeviceKind::classify(&record);
        if kind.is_gate() && !config.include_gates {
            debug!(device_id = record.id.as_str(), "gates disabled, skipping");
            continue;
        }
        info!(
            device_id = record.id.as_str(),
            nickname = record.nickname.as_str(),
            kind = kind.type_label(),
            "discovered device"
        );
        accessories.push(DoorAccessory::new(&record, api.clone(), config));
    }
    Ok(accessories)
}
