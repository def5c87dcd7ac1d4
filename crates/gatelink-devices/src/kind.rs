//! Device classification.
//!
//! The remote API reports loosely-typed records; discovery narrows each
//! one into a closed set of kinds carrying the metadata its commands
//! require.

use gatelink_client::{CommandMetadata, DeviceRecord};

/// Product code prefix used by gate controllers.
const GATE_PRODUCT_PREFIX: &str = "GL-GT";

/// The kinds of door device this bridge understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// A garage door opener.
    Garage {
        /// Product code, mandatory for command metadata.
        product_code: String,
    },
    /// A driveway or pedestrian gate.
    Gate {
        /// Product code, mandatory for command metadata.
        product_code: String,
    },
}

impl DeviceKind {
    /// Classify a raw device record.
    ///
    /// The `deviceType` label wins when present; older firmware omits it,
    /// in which case the product code prefix decides.
    pub fn classify(record: &DeviceRecord) -> Self {
        let is_gate = match record.device_type.as_deref() {
            Some(label) => label.eq_ignore_ascii_case("gate"),
            None => record.product_code.starts_with(GATE_PRODUCT_PREFIX),
        };
        if is_gate {
            DeviceKind::Gate {
                product_code: record.product_code.clone(),
            }
        } else {
            DeviceKind::Garage {
                product_code: record.product_code.clone(),
            }
        }
    }

    /// Whether this is a gate.
    pub fn is_gate(&self) -> bool {
        matches!(self, DeviceKind::Gate { .. })
    }

    /// The type label sent in command metadata.
    pub fn type_label(&self) -> &'static str {
        match self {
            DeviceKind::Garage { .. } => "garage",
            DeviceKind::Gate { .. } => "gate",
        }
    }

    /// Default command metadata for this device.
    pub fn metadata(&self) -> CommandMetadata {
        let product_code = match self {
            DeviceKind::Garage { product_code } | DeviceKind::Gate { product_code } => {
                product_code.clone()
            }
        };
        CommandMetadata {
            device_type: self.type_label().to_string(),
            product_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use gatelink_client::RemoteStatus;

    #[test]
    fn test_classify_by_label() {
        let mut gate = record("gt-1", RemoteStatus::Closed);
        gate.device_type = Some("Gate".to_string());
        gate.product_code = "GL-GD2".to_string();
        assert!(DeviceKind::classify(&gate).is_gate());

        let mut garage = record("gd-1", RemoteStatus::Closed);
        garage.device_type = Some("garage".to_string());
        assert!(!DeviceKind::classify(&garage).is_gate());
    }

    #[test]
    fn test_classify_by_product_code_when_label_missing() {
        let mut gate = record("gt-1", RemoteStatus::Closed);
        gate.device_type = None;
        gate.product_code = "GL-GT1".to_string();
        assert!(DeviceKind::classify(&gate).is_gate());

        let mut garage = record("gd-1", RemoteStatus::Closed);
        garage.device_type = None;
        garage.product_code = "GL-GD2".to_string();
        assert!(!DeviceKind::classify(&garage).is_gate());
    }

    #[test]
    fn test_metadata_carries_product_code() {
        let kind = DeviceKind::Gate {
            product_code: "GL-GT1".to_string(),
        };
        let metadata = kind.metadata();
        assert_eq!(metadata.device_type, "gate");
        assert_eq!(metadata.product_code, "GL-GT1");
    }
}
