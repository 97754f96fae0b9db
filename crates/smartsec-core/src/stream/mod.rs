// ── Status subscription ──
//
// Subscription type for consuming published snapshots from the engine.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::StatusSnapshot;

/// A subscription to the engine's published status.
///
/// Only snapshots published after subscribing are delivered by
/// [`changed()`](Self::changed). Intermediate values are coalesced: a slow
/// consumer only sees the latest.
pub struct StatusStream {
    receiver: watch::Receiver<Option<Arc<StatusSnapshot>>>,
}

impl StatusStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Option<Arc<StatusSnapshot>>>) -> Self {
        drop(receiver.borrow_and_update());
        Self { receiver }
    }

    /// Wait for the next published snapshot.
    /// Returns `None` once the engine has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<StatusSnapshot>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            if let Some(snap) = snap {
                return Some(snap);
            }
        }
    }
}
