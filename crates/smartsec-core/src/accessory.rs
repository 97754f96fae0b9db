// ── Security-system accessory bridge ──
//
// Accessory-facing surface over a `StateSyncEngine`: characteristic
// getters, the target-state setter, change callbacks, and the static
// accessory information.

use std::sync::Arc;

use serde::Serialize;
use strum::Display;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::DeviceClient;
use crate::engine::StateSyncEngine;
use crate::error::CoreError;
use crate::model::{ArmingState, FaultStatus, LowBatteryStatus, StatusSnapshot, TargetState};

const MANUFACTURER: &str = "ADT";
const SERIAL_NUMBER: &str = "See ADT Smart Security app";

const CURRENT_STATE_VALUES: &[u8] = &[0, 1, 3, 4];
const TARGET_STATE_VALUES: &[u8] = &[0, 1, 3];
const FLAG_VALUES: &[u8] = &[0, 1];

/// Characteristics exposed by the security-system service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum Characteristic {
    SecuritySystemCurrentState,
    SecuritySystemTargetState,
    StatusFault,
    BatteryLevel,
    StatusLowBattery,
}

impl Characteristic {
    /// Allowed values, for characteristics restricted to a fixed set.
    pub fn valid_values(self) -> Option<&'static [u8]> {
        match self {
            Self::SecuritySystemCurrentState => Some(CURRENT_STATE_VALUES),
            Self::SecuritySystemTargetState => Some(TARGET_STATE_VALUES),
            Self::StatusFault | Self::StatusLowBattery => Some(FLAG_VALUES),
            Self::BatteryLevel => None,
        }
    }
}

/// One characteristic value to push to the accessory host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharacteristicUpdate {
    pub characteristic: Characteristic,
    pub value: u8,
}

/// Map a snapshot onto every characteristic it drives.
pub fn characteristic_updates(snapshot: &StatusSnapshot) -> [CharacteristicUpdate; 5] {
    let update = |characteristic, value| CharacteristicUpdate {
        characteristic,
        value,
    };
    [
        update(
            Characteristic::SecuritySystemCurrentState,
            snapshot.arming_state.code(),
        ),
        update(
            Characteristic::SecuritySystemTargetState,
            snapshot.target_state.code(),
        ),
        update(Characteristic::StatusFault, snapshot.fault_status.code()),
        update(Characteristic::BatteryLevel, snapshot.battery_level),
        update(
            Characteristic::StatusLowBattery,
            snapshot.low_battery_status.code(),
        ),
    ]
}

/// Static accessory information service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessoryInformation {
    pub name: String,
    pub manufacturer: String,
    pub serial_number: String,
}

/// The accessory a host registers for one security panel.
pub struct SecuritySystemAccessory<C: DeviceClient> {
    engine: StateSyncEngine<C>,
    information: AccessoryInformation,
}

impl<C: DeviceClient> SecuritySystemAccessory<C> {
    pub fn new(engine: StateSyncEngine<C>) -> Self {
        let information = AccessoryInformation {
            name: engine.name().to_owned(),
            manufacturer: MANUFACTURER.into(),
            serial_number: SERIAL_NUMBER.into(),
        };
        Self {
            engine,
            information,
        }
    }

    pub fn engine(&self) -> &StateSyncEngine<C> {
        &self.engine
    }

    pub fn accessory_information(&self) -> &AccessoryInformation {
        &self.information
    }

    pub fn identify(&self) {
        info!(name = %self.information.name, "identify requested (not supported)");
    }

    // ── Getters ──────────────────────────────────────────────────
    //
    // Each waits for a snapshot when the cache is empty.

    pub async fn battery_level(&self) -> u8 {
        self.engine.get_state().await.battery_level
    }

    pub async fn low_battery_status(&self) -> LowBatteryStatus {
        self.engine.get_state().await.low_battery_status
    }

    pub async fn fault_status(&self) -> FaultStatus {
        self.engine.get_state().await.fault_status
    }

    pub async fn current_state(&self) -> ArmingState {
        self.engine.get_state().await.arming_state
    }

    /// The staged target while a request is in flight, else the panel's.
    pub async fn target_state(&self) -> TargetState {
        if let Some(pending) = self.engine.pending_target() {
            return pending;
        }
        self.engine.get_state().await.target_state
    }

    // ── Setter ───────────────────────────────────────────────────

    /// Forward a target-state write. Fails only when the panel is not
    /// ready to change state.
    pub fn set_target_state(&self, target: TargetState) -> Result<(), CoreError> {
        self.engine.request_target_state(target)
    }

    // ── Notifications ────────────────────────────────────────────

    /// Invoke `callback` with every snapshot the engine publishes from
    /// now on. The returned task ends once every engine handle, this
    /// accessory included, is dropped; abort it to unregister earlier.
    pub fn on_state_changed<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(Arc<StatusSnapshot>) + Send + 'static,
    {
        let mut stream = self.engine.subscribe();
        tokio::spawn(async move {
            while let Some(snapshot) = stream.changed().await {
                callback(snapshot);
            }
            debug!("state change listener stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn updates_cover_every_characteristic() {
        let snapshot = StatusSnapshot {
            arming_state: ArmingState::ArmedStay,
            target_state: TargetState::ArmedStay,
            fault_status: FaultStatus::Fault,
            battery_level: 64,
            low_battery_status: LowBatteryStatus::Normal,
            fetched_at: Utc::now(),
        };

        let updates = characteristic_updates(&snapshot);
        let values: Vec<_> = updates.iter().map(|u| (u.characteristic, u.value)).collect();
        assert_eq!(
            values,
            vec![
                (Characteristic::SecuritySystemCurrentState, 3),
                (Characteristic::SecuritySystemTargetState, 3),
                (Characteristic::StatusFault, 1),
                (Characteristic::BatteryLevel, 64),
                (Characteristic::StatusLowBattery, 0),
            ]
        );
    }

    #[test]
    fn values_stay_within_valid_sets() {
        let snapshot = StatusSnapshot {
            arming_state: ArmingState::Triggered,
            target_state: TargetState::ArmedAway,
            fault_status: FaultStatus::NoFault,
            battery_level: 100,
            low_battery_status: LowBatteryStatus::Low,
            fetched_at: Utc::now(),
        };

        for update in characteristic_updates(&snapshot) {
            if let Some(valid) = update.characteristic.valid_values() {
                assert!(
                    valid.contains(&update.value),
                    "{} = {} not in {valid:?}",
                    update.characteristic,
                    update.value
                );
            }
        }
    }

    #[test]
    fn night_is_not_a_valid_current_state() {
        let valid = Characteristic::SecuritySystemCurrentState
            .valid_values()
            .unwrap_or_default();
        assert!(!valid.contains(&ArmingState::ArmedNight.code()));
    }
}
