//! `smartsec watch`: stream snapshots (or characteristic updates) as the
//! cache refreshes, until interrupted.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use smartsec_core::{
    ConnectionState, PortalDevice, SecuritySystemAccessory, StateSyncEngine, StatusSnapshot,
    characteristic_updates,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::commands::status::StatusView;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: WatchArgs,
    engine: &StateSyncEngine<PortalDevice>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let accessory = SecuritySystemAccessory::new(engine.clone());
    let color = output::should_color(&global.color);
    let emit = |snapshot: &StatusSnapshot| {
        if args.characteristics {
            for update in characteristic_updates(snapshot) {
                let out = output::render_stream_item(
                    &global.output,
                    &update,
                    |u| format!("{} = {}", u.characteristic, u.value),
                    |u| format!("{}={}", u.characteristic, u.value),
                );
                output::print_output(&out, global.quiet);
            }
        } else {
            let view = StatusView::new(engine.name(), snapshot, engine.pending_target());
            let out = output::render_stream_item(
                &global.output,
                &view,
                |v| v.line(color),
                |v| v.arming_state.to_string(),
            );
            output::print_output(&out, global.quiet);
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<StatusSnapshot>>();
    let listener = accessory.on_state_changed(move |snapshot| {
        let _ = tx.send(snapshot);
    });
    let mut state = engine.connection_state();

    emit(&*engine.get_state().await);
    let mut seen = 1;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        if args.count.is_some_and(|limit| seen >= limit) {
            break Ok(());
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break Ok(());
            }
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break Ok(()) };
                emit(&snapshot);
                seen += 1;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                if *state.borrow_and_update() == ConnectionState::Failed {
                    break Err(CliError::ConnectionFailed {
                        message: "status refresh stopped after re-initialization failed".into(),
                    });
                }
            }
        }
    };

    listener.abort();
    result
}
