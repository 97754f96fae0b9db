//! `smartsec status`: one snapshot, rendered in the chosen format.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use smartsec_core::{
    ArmingState, FaultStatus, LowBatteryStatus, PortalDevice, StateSyncEngine, StatusSnapshot,
    TargetState,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Field};

const DEFAULT_WAIT_SECS: u64 = 30;

/// Serializable status view shared by `status` and `watch`.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub name: String,
    pub arming_state: ArmingState,
    pub target_state: TargetState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_target: Option<TargetState>,
    pub fault_status: FaultStatus,
    pub battery_level: u8,
    pub low_battery_status: LowBatteryStatus,
    pub fetched_at: DateTime<Utc>,
}

impl StatusView {
    pub fn new(name: &str, snapshot: &StatusSnapshot, pending_target: Option<TargetState>) -> Self {
        Self {
            name: name.to_owned(),
            arming_state: snapshot.arming_state,
            target_state: snapshot.target_state,
            pending_target,
            fault_status: snapshot.fault_status,
            battery_level: snapshot.battery_level,
            low_battery_status: snapshot.low_battery_status,
            fetched_at: snapshot.fetched_at,
        }
    }

    /// Key/value table for the detail view.
    pub fn detail(&self, color: bool) -> String {
        let mut rows = vec![
            Field {
                name: "Name",
                value: self.name.clone(),
            },
            Field {
                name: "State",
                value: output::paint_arming_state(self.arming_state, color),
            },
            Field {
                name: "Target",
                value: self.target_state.to_string(),
            },
        ];
        if let Some(pending) = self.pending_target {
            rows.push(Field {
                name: "Pending",
                value: pending.to_string(),
            });
        }
        rows.extend([
            Field {
                name: "Fault",
                value: output::paint_flag(self.fault_status == FaultStatus::Fault, color),
            },
            Field {
                name: "Battery",
                value: format!("{}%", self.battery_level),
            },
            Field {
                name: "Low battery",
                value: output::paint_flag(self.low_battery_status == LowBatteryStatus::Low, color),
            },
            Field {
                name: "Fetched",
                value: format!(
                    "{} ({} ago)",
                    self.fetched_at.with_timezone(&Local).format("%H:%M:%S"),
                    age(self.fetched_at)
                ),
            },
        ]);
        output::render_table(&rows)
    }

    /// Single-line summary for streaming output.
    pub fn line(&self, color: bool) -> String {
        let fault = if self.fault_status == FaultStatus::Fault {
            "  FAULT"
        } else {
            ""
        };
        format!(
            "{}  {:<20}  battery {:>3}%{fault}",
            self.fetched_at.with_timezone(&Local).format("%H:%M:%S"),
            output::paint_arming_state(self.arming_state, color),
            self.battery_level,
        )
    }
}

/// Human-readable time since `at`, to the second.
fn age(at: DateTime<Utc>) -> String {
    let elapsed = (Utc::now() - at).to_std().unwrap_or_default();
    humantime::format_duration(Duration::from_secs(elapsed.as_secs())).to_string()
}

pub async fn handle(
    engine: &StateSyncEngine<PortalDevice>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let wait = Duration::from_secs(global.timeout.unwrap_or(DEFAULT_WAIT_SECS));
    let snapshot = engine.get_state_timeout(wait).await?;
    let view = StatusView::new(engine.name(), &snapshot, engine.pending_target());

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| v.detail(color),
        |v| v.arming_state.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
