//! Wire types reported by the remote device API.
//!
//! Everything here is read-only to the device layer: records are a
//! snapshot of remote truth at poll time, never mutated locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device identifier assigned by the remote API.
pub type DeviceId = String;

/// Door status as reported by the remote API.
///
/// The wire value is a free-form string; anything other than the two
/// recognized terminal statuses is preserved in [`RemoteStatus::Unrecognized`]
/// so callers can log exactly what the device claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteStatus {
    /// Door is fully open.
    Open,
    /// Door is fully closed.
    Closed,
    /// Any other reported value, kept verbatim.
    Unrecognized(String),
}

impl RemoteStatus {
    /// Whether this is one of the two recognized terminal statuses.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RemoteStatus::Open | RemoteStatus::Closed)
    }
}

impl From<String> for RemoteStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "open" => RemoteStatus::Open,
            "closed" => RemoteStatus::Closed,
            _ => RemoteStatus::Unrecognized(raw),
        }
    }
}

impl From<RemoteStatus> for String {
    fn from(status: RemoteStatus) -> Self {
        match status {
            RemoteStatus::Open => "open".to_string(),
            RemoteStatus::Closed => "closed".to_string(),
            RemoteStatus::Unrecognized(raw) => raw,
        }
    }
}

impl std::fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteStatus::Open => write!(f, "open"),
            RemoteStatus::Closed => write!(f, "closed"),
            RemoteStatus::Unrecognized(raw) => write!(f, "unrecognized({})", raw),
        }
    }
}

/// Snapshot of a device as listed by the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device identifier.
    pub id: DeviceId,
    /// User-assigned display name.
    pub nickname: String,
    /// Reported door status at list time.
    pub status: RemoteStatus,
    /// When the device last completed an operation, per the remote API.
    #[serde(rename = "lastOperationTimestamp")]
    pub last_operation_at: DateTime<Utc>,
    /// Product code, e.g. "GL-GD2" for second-generation garage openers.
    #[serde(rename = "productCode")]
    pub product_code: String,
    /// Device type label, absent on older firmware.
    #[serde(rename = "deviceType")]
    pub device_type: Option<String>,
}

/// Inner payload of a device state query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceState {
    /// Reported door status.
    pub status: RemoteStatus,
    /// When the device last completed an operation.
    #[serde(rename = "lastOperationTimestamp")]
    pub last_operation_at: DateTime<Utc>,
}

/// Response envelope for a device state query.
///
/// The remote API nests the payload under a capitalized `Result` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStateEnvelope {
    /// The reported state.
    #[serde(rename = "Result")]
    pub result: DeviceState,
}

/// Device-type metadata attached to every open/close command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Device type label, e.g. "garage" or "gate".
    #[serde(rename = "deviceType")]
    pub device_type: String,
    /// Product code of the target device.
    #[serde(rename = "productCode")]
    pub product_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_known_strings() {
        assert_eq!(RemoteStatus::from("open".to_string()), RemoteStatus::Open);
        assert_eq!(RemoteStatus::from("Open".to_string()), RemoteStatus::Open);
        assert_eq!(
            RemoteStatus::from("CLOSED".to_string()),
            RemoteStatus::Closed
        );
    }

    #[test]
    fn test_status_preserves_unknown_strings() {
        let status = RemoteStatus::from("ajar".to_string());
        assert_eq!(status, RemoteStatus::Unrecognized("ajar".to_string()));
        assert!(!status.is_terminal());
        assert_eq!(String::from(status), "ajar");
    }

    #[test]
    fn test_device_record_wire_format() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "id": "gd-1",
                "nickname": "Main Garage",
                "status": "Open",
                "lastOperationTimestamp": "2026-03-01T08:30:00Z",
                "productCode": "GL-GD2",
                "deviceType": "garage"
            }"#,
        )
        .unwrap();

        assert_eq!(record.id, "gd-1");
        assert_eq!(record.status, RemoteStatus::Open);
        assert_eq!(record.device_type.as_deref(), Some("garage"));
    }

    #[test]
    fn test_device_record_without_device_type() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "id": "gd-2",
                "nickname": "Side Gate",
                "status": "ajar",
                "lastOperationTimestamp": "2026-03-01T08:30:00Z",
                "productCode": "GL-GT1"
            }"#,
        )
        .unwrap();

        assert!(record.device_type.is_none());
        assert!(matches!(record.status, RemoteStatus::Unrecognized(_)));
    }

    #[test]
    fn test_state_envelope() {
        let envelope: DeviceStateEnvelope = serde_json::from_str(
            r#"{"Result": {"status": "closed", "lastOperationTimestamp": "2026-03-01T09:00:00Z"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.result.status, RemoteStatus::Closed);
    }
}
