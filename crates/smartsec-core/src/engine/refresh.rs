// ── Refresh scheduling ──
//
// Cache expiry is the poll clock: each `Expired` event triggers one
// fetch, and storing the result re-arms the TTL. A failed fetch is
// treated as a lost session and answered with one full re-initialization.
// The task only holds a weak reference, so dropping every engine handle
// ends it.

use std::sync::{Arc, Weak};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::DeviceClient;
use crate::error::CoreError;
use crate::model::StatusSnapshot;
use crate::store::CacheEvent;

use super::{ConnectionState, EngineInner, StateSyncEngine};

/// Log in, fetch the first snapshot, and seed the cache.
///
/// Leaves the engine `Ready` on success and `Failed` otherwise. Does not
/// touch the refresh listener.
pub(super) async fn bootstrap<C: DeviceClient>(
    engine: &StateSyncEngine<C>,
) -> Result<Arc<StatusSnapshot>, CoreError> {
    engine.set_state(ConnectionState::Initializing);

    if let Err(e) = engine.inner.client.login().await {
        let e = as_auth_error(e);
        error!(error = %e, "initialization failed");
        engine.set_state(ConnectionState::Failed);
        return Err(e);
    }

    debug!("initializing status");
    let snapshot = match engine.inner.client.current_status().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let e = as_fetch_error(e);
            error!(error = %e, "initial status fetch failed");
            engine.set_state(ConnectionState::Failed);
            return Err(e);
        }
    };

    let stored = engine.publish(snapshot);
    engine.set_state(ConnectionState::Ready);
    info!(
        name = %engine.inner.name,
        arming_state = %stored.arming_state,
        "status initialized"
    );
    Ok(stored)
}

/// React to cache expiry until cancelled, recovery fails, or the engine
/// is dropped.
///
/// Refreshes run strictly one after another: the next `Expired` event
/// cannot occur before this task stores a new snapshot.
pub(super) async fn refresh_task<C: DeviceClient>(
    weak: Weak<EngineInner<C>>,
    mut events: broadcast::Receiver<CacheEvent>,
    cancel: CancellationToken,
) {
    if let Some(inner) = weak.upgrade() {
        info!(ttl_secs = inner.cache.ttl().as_secs(), "auto-refresh enabled");
    }

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        let Some(inner) = weak.upgrade() else { break };
        let engine = StateSyncEngine { inner };

        match event {
            Ok(CacheEvent::Expired(_)) => {}
            Ok(CacheEvent::Set(_)) => continue,
            // A missed `Expired` leaves the cache empty; refresh to recover.
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "refresh listener lagged");
                if !engine.inner.cache.is_empty() {
                    continue;
                }
            }
            Err(RecvError::Closed) => break,
        }

        debug!("status expired, refreshing");
        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            fetched = engine.inner.client.current_status() => fetched,
        };

        match fetched {
            Ok(snapshot) => {
                let stored = engine.publish(snapshot);
                debug!(arming_state = %stored.arming_state, "status refreshed");
            }
            Err(e) => {
                error!(error = %as_fetch_error(e), "status refresh failed, re-initializing");
                let recovered = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    recovered = bootstrap(&engine) => recovered,
                };
                if recovered.is_err() {
                    warn!("re-initialization failed, auto-refresh stopped");
                    break;
                }
            }
        }
    }

    debug!("refresh listener stopped");
}

// ── Helpers ──────────────────────────────────────────────────────

fn as_auth_error(err: CoreError) -> CoreError {
    match err {
        CoreError::AuthenticationFailed { .. } => err,
        other => CoreError::AuthenticationFailed {
            message: other.to_string(),
        },
    }
}

fn as_fetch_error(err: CoreError) -> CoreError {
    match err {
        CoreError::Fetch { .. } => err,
        other => CoreError::Fetch {
            message: other.to_string(),
        },
    }
}
