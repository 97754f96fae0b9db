//! `smartsec arm` / `smartsec disarm`: forward a target state, optionally
//! waiting for the panel to report it.

use std::time::Duration;

use serde::Serialize;

use smartsec_core::{
    ArmingState, PortalDevice, SecuritySystemAccessory, StateSyncEngine, TargetState,
};

use crate::cli::{ArmArgs, ArmMode, DisarmArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Result of a state change request, for structured output.
#[derive(Debug, Serialize)]
struct RequestOutcome {
    target: TargetState,
    confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    arming_state: Option<ArmingState>,
}

fn target_for(mode: ArmMode) -> TargetState {
    match mode {
        ArmMode::Away => TargetState::ArmedAway,
        ArmMode::Stay => TargetState::ArmedStay,
    }
}

pub async fn handle_arm(
    args: ArmArgs,
    engine: &StateSyncEngine<PortalDevice>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    request(engine, target_for(args.mode), args.wait.wait, global).await
}

pub async fn handle_disarm(
    args: DisarmArgs,
    engine: &StateSyncEngine<PortalDevice>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    request(engine, TargetState::Disarmed, args.wait.wait, global).await
}

async fn request(
    engine: &StateSyncEngine<PortalDevice>,
    target: TargetState,
    wait: Option<Duration>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let accessory = SecuritySystemAccessory::new(engine.clone());
    // Subscribe first so the confirming refresh cannot slip past.
    let mut updates = engine.subscribe();

    accessory.set_target_state(target)?;

    let outcome = match wait {
        None => RequestOutcome {
            target,
            confirmed: false,
            arming_state: None,
        },
        Some(limit) => {
            let wanted = target.arming_state();
            let reached = tokio::time::timeout(limit, async {
                while let Some(snapshot) = updates.changed().await {
                    if snapshot.arming_state == wanted {
                        return Some(snapshot.arming_state);
                    }
                }
                None
            })
            .await
            .map_err(|_| CliError::Timeout {
                seconds: limit.as_secs() + u64::from(limit.subsec_nanos() > 0),
            })?;
            RequestOutcome {
                target,
                confirmed: reached.is_some(),
                arming_state: reached,
            }
        }
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &outcome,
        |o| match o.arming_state {
            Some(state) => format!(
                "✓ Panel reports {}",
                output::paint_arming_state(state, color)
            ),
            None => format!("✓ Requested {}", o.target),
        },
        |o| o.target.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
