//! Command handlers that need a live engine.

pub mod arm;
pub mod config_cmd;
pub mod status;
pub mod watch;

use smartsec_core::{PortalDevice, StateSyncEngine};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route an engine-backed command to its handler.
pub async fn dispatch(
    cmd: Command,
    engine: &StateSyncEngine<PortalDevice>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(engine, global).await,
        Command::Watch(args) => watch::handle(args, engine, global).await,
        Command::Arm(args) => arm::handle_arm(args, engine, global).await,
        Command::Disarm(args) => arm::handle_disarm(args, engine, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled without a portal connection".into(),
        }),
    }
}
