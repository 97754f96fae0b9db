// ── Arming guard ──

use crate::error::CoreError;
use crate::model::{StatusSnapshot, TargetState};

/// Decide whether a transition to `target` may be sent to the device.
///
/// The only refusal is a panel reporting a triggered alarm with an
/// active fault ("not ready"). Without a cached snapshot the request is
/// let through; the next poll shows the real outcome.
pub(crate) fn check_transition(
    current: Option<&StatusSnapshot>,
    target: TargetState,
) -> Result<(), CoreError> {
    match current {
        Some(snapshot) if snapshot.is_not_ready() => Err(CoreError::NotReady { target }),
        _ => Ok(()),
    }
}
