// Portal API wire types
//
// Raw JSON shapes exchanged with the portal. Codes stay numeric here;
// `smartsec-core` converts them into typed domain enums.

use serde::{Deserialize, Serialize};

/// Response body of `GET /api/status`.
///
/// ```json
/// { "alarm": { "armingState": 0, "targetState": 0, "faultStatus": 0,
///              "batteryLevel": 100, "lowBatteryStatus": 0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalStatus {
    pub alarm: AlarmStatus,
}

/// Alarm section of the status payload. Every field is a raw
/// characteristic code as reported by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmStatus {
    pub arming_state: u8,
    pub target_state: u8,
    #[serde(default)]
    pub fault_status: u8,
    #[serde(default)]
    pub battery_level: i64,
    /// Older portal firmware misspells this field.
    #[serde(default, alias = "lowBatterStatus")]
    pub low_battery_status: u8,
}

/// Body of `POST /api/state`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChangeRequest {
    pub target_state: u8,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_camel_case_payload() {
        let body = r#"{"alarm":{"armingState":1,"targetState":1,"faultStatus":0,
            "batteryLevel":87,"lowBatteryStatus":0}}"#;
        let status: PortalStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.alarm.arming_state, 1);
        assert_eq!(status.alarm.battery_level, 87);
    }

    #[test]
    fn status_accepts_misspelled_low_battery_field() {
        let body = r#"{"alarm":{"armingState":0,"targetState":0,"lowBatterStatus":1}}"#;
        let status: PortalStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.alarm.low_battery_status, 1);
        assert_eq!(status.alarm.fault_status, 0);
    }

    #[test]
    fn state_change_serializes_camel_case() {
        let body = serde_json::to_string(&StateChangeRequest { target_state: 3 }).unwrap();
        assert_eq!(body, r#"{"targetState":3}"#);
    }
}
