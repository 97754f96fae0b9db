// ── Wire-to-domain conversion ──
//
// Maps raw portal payloads (numeric codes) into typed snapshots.
// An unknown code is a fetch failure: the engine never caches a
// snapshot it cannot represent.

use chrono::Utc;

use smartsec_api::PortalStatus;

use crate::error::CoreError;
use crate::model::{ArmingState, FaultStatus, LowBatteryStatus, StatusSnapshot, TargetState};

fn unknown(field: &str, code: impl std::fmt::Display) -> CoreError {
    CoreError::Fetch {
        message: format!("unknown {field} code {code}"),
    }
}

impl TryFrom<PortalStatus> for StatusSnapshot {
    type Error = CoreError;

    fn try_from(status: PortalStatus) -> Result<Self, Self::Error> {
        let alarm = status.alarm;

        let arming_state = ArmingState::from_code(alarm.arming_state)
            .ok_or_else(|| unknown("arming state", alarm.arming_state))?;
        let target_state = TargetState::from_code(alarm.target_state)
            .ok_or_else(|| unknown("target state", alarm.target_state))?;
        let fault_status = FaultStatus::from_code(alarm.fault_status)
            .ok_or_else(|| unknown("fault status", alarm.fault_status))?;
        let low_battery_status = LowBatteryStatus::from_code(alarm.low_battery_status)
            .ok_or_else(|| unknown("low battery status", alarm.low_battery_status))?;

        // Clamped, so the conversion cannot fail.
        let battery_level = u8::try_from(alarm.battery_level.clamp(0, 100)).unwrap_or(100);

        Ok(Self {
            arming_state,
            target_state,
            fault_status,
            battery_level,
            low_battery_status,
            fetched_at: Utc::now(),
        })
    }
}
