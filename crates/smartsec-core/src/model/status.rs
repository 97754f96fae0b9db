// ── Alarm status domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Observed security-panel mode.
///
/// Discriminants are the accessory characteristic codes for
/// SecuritySystemCurrentState.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArmingState {
    Disarmed = 0,
    ArmedAway = 1,
    /// Reserved by the characteristic; the portal never reports it.
    ArmedNight = 2,
    ArmedStay = 3,
    Triggered = 4,
}

impl ArmingState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Disarmed),
            1 => Some(Self::ArmedAway),
            2 => Some(Self::ArmedNight),
            3 => Some(Self::ArmedStay),
            4 => Some(Self::Triggered),
            _ => None,
        }
    }
}

/// Desired arming state requested by a caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetState {
    Disarmed = 0,
    #[strum(to_string = "armed_away", serialize = "away")]
    ArmedAway = 1,
    #[strum(to_string = "armed_stay", serialize = "stay", serialize = "home")]
    ArmedStay = 3,
}

impl TargetState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Disarmed),
            1 => Some(Self::ArmedAway),
            3 => Some(Self::ArmedStay),
            _ => None,
        }
    }

    /// The arming state the panel reports once this target is reached.
    pub fn arming_state(self) -> ArmingState {
        match self {
            Self::Disarmed => ArmingState::Disarmed,
            Self::ArmedAway => ArmingState::ArmedAway,
            Self::ArmedStay => ArmingState::ArmedStay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FaultStatus {
    NoFault = 0,
    Fault = 1,
}

impl FaultStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NoFault),
            1 => Some(Self::Fault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LowBatteryStatus {
    Normal = 0,
    Low = 1,
}

impl LowBatteryStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Low),
            _ => None,
        }
    }
}

/// One immutable reading of the panel, produced by a device fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub arming_state: ArmingState,
    pub target_state: TargetState,
    pub fault_status: FaultStatus,
    /// Percent, always within `0..=100`.
    pub battery_level: u8,
    pub low_battery_status: LowBatteryStatus,
    /// When the fetch that produced this snapshot completed.
    pub fetched_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// The panel refuses to arm: the alarm is triggered and a fault is active.
    pub fn is_not_ready(&self) -> bool {
        self.arming_state == ArmingState::Triggered && self.fault_status == FaultStatus::Fault
    }
}
