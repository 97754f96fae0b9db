// ── State sync engine ──
//
// Lifecycle for one security panel: authenticate, seed the cache,
// keep it fresh through TTL-driven refreshes, serve reads from the
// cache, and forward arm/disarm requests to the device.

mod policy;
mod refresh;

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{DeviceClient, PortalDevice};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{StatusSnapshot, TargetState};
use crate::store::StatusCache;
use crate::stream::StatusStream;

use self::refresh::{bootstrap, refresh_task};

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `init` has not run, or the engine was shut down.
    Uninitialized,
    /// Logging in and fetching the first snapshot.
    Initializing,
    /// The refresh listener is armed.
    Ready,
    /// The last (re)initialization failed; no listener is armed.
    Failed,
}

// ── StateSyncEngine ──────────────────────────────────────────────

/// Keeps a cached view of the panel in sync with the device.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Nothing talks to the device
/// until [`init()`](Self::init) is called.
pub struct StateSyncEngine<C: DeviceClient> {
    inner: Arc<EngineInner<C>>,
}

impl<C: DeviceClient> Clone for StateSyncEngine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<C> {
    name: String,
    client: C,
    cache: StatusCache,
    /// Target staged by the most recent accepted request, until the
    /// device reports it.
    pending_target: watch::Sender<Option<TargetState>>,
    /// Last snapshot pushed to subscribers.
    published: watch::Sender<Option<Arc<StatusSnapshot>>>,
    state: watch::Sender<ConnectionState>,
    /// The armed refresh listener, replaced on every `init`.
    refresh: Mutex<Option<RefreshHandle>>,
    /// State change requests still on their way to the device.
    in_flight: std::sync::Mutex<JoinSet<()>>,
}

impl<C> Drop for EngineInner<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh.get_mut().take() {
            handle.cancel.cancel();
        }
    }
}

struct RefreshHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StateSyncEngine<PortalDevice> {
    /// Build an engine that talks to the hosted portal described by
    /// `config`. Does NOT initialize.
    pub fn from_config(config: &EngineConfig) -> Result<Self, CoreError> {
        let device = PortalDevice::from_config(config)?;
        Self::new(config, device)
    }
}

impl<C: DeviceClient> StateSyncEngine<C> {
    /// Create an engine around `client`. Must be called from within a
    /// Tokio runtime (the cache owns a timer task).
    pub fn new(config: &EngineConfig, client: C) -> Result<Self, CoreError> {
        Self::with_ttl(config.name.clone(), client, config.cache_ttl)
    }

    /// Create an engine with an explicit cache TTL.
    ///
    /// A zero TTL is rejected: every stored snapshot would expire at once
    /// and the refresh loop would fetch without pause.
    pub fn with_ttl(
        name: impl Into<String>,
        client: C,
        ttl: Duration,
    ) -> Result<Self, CoreError> {
        if ttl.is_zero() {
            return Err(CoreError::Config {
                message: "cache TTL must be non-zero".into(),
            });
        }

        let (pending_target, _) = watch::channel(None);
        let (published, _) = watch::channel(None);
        let (state, _) = watch::channel(ConnectionState::Uninitialized);

        Ok(Self {
            inner: Arc::new(EngineInner {
                name: name.into(),
                client,
                cache: StatusCache::new(ttl),
                pending_target,
                published,
                state,
                refresh: Mutex::new(None),
                in_flight: std::sync::Mutex::new(JoinSet::new()),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The status cache backing [`get_state()`](Self::get_state).
    pub fn cache(&self) -> &StatusCache {
        &self.inner.cache
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Authenticate, fetch the first snapshot, and arm the refresh
    /// listener.
    ///
    /// Any listener from a previous `init` is disarmed first, so at most
    /// one is ever active. On failure the error is logged, the state
    /// becomes [`Failed`](ConnectionState::Failed), and no listener is armed.
    pub async fn init(&self) -> Result<(), CoreError> {
        let mut slot = self.inner.refresh.lock().await;
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            let _ = previous.task.await;
            debug!("previous refresh listener disarmed");
        }

        // Subscribe before seeding so the first expiry cannot be missed.
        let expired = self.inner.cache.subscribe();
        bootstrap(self).await?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(refresh_task(
            Arc::downgrade(&self.inner),
            expired,
            cancel.clone(),
        ));
        *slot = Some(RefreshHandle { cancel, task });
        Ok(())
    }

    /// Disarm the refresh listener, let in-flight state change requests
    /// finish, and end the device session.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.inner.refresh.lock().await.take() {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }

        let mut in_flight = std::mem::take(
            &mut *self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        while in_flight.join_next().await.is_some() {}

        if let Err(e) = self.inner.client.logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }

        self.inner.cache.clear();
        self.set_state(ConnectionState::Uninitialized);
        debug!("engine shut down");
    }

    /// Observe lifecycle transitions.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Whether a refresh listener is currently armed.
    pub async fn is_refreshing(&self) -> bool {
        self.inner
            .refresh
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }

    // ── Reads ────────────────────────────────────────────────────

    /// The current snapshot.
    ///
    /// Served from the cache when fresh; otherwise waits for the next
    /// refresh to store one. There is no timeout: use
    /// [`get_state_timeout()`](Self::get_state_timeout) to bound the
    /// wait, or drop the future to give up.
    pub async fn get_state(&self) -> Arc<StatusSnapshot> {
        self.inner.cache.wait_for_value().await
    }

    /// [`get_state()`](Self::get_state) bounded by `timeout`.
    pub async fn get_state_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Arc<StatusSnapshot>, CoreError> {
        tokio::time::timeout(timeout, self.get_state())
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0),
            })
    }

    /// The fresh cached snapshot, without waiting.
    pub fn cached_state(&self) -> Option<Arc<StatusSnapshot>> {
        self.inner.cache.get()
    }

    /// Subscribe to snapshots as they are published.
    pub fn subscribe(&self) -> StatusStream {
        StatusStream::new(self.inner.published.subscribe())
    }

    /// The staged target of the last accepted request, if the device has
    /// not reported it yet.
    pub fn pending_target(&self) -> Option<TargetState> {
        *self.inner.pending_target.borrow()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Ask the device to move to `target`.
    ///
    /// Refused with [`CoreError::NotReady`] when the cached snapshot
    /// reports a triggered alarm with an active fault. Otherwise the
    /// request is handed to the device in the background and this
    /// returns immediately; the outcome shows up in a later refresh.
    pub fn request_target_state(&self, target: TargetState) -> Result<(), CoreError> {
        info!(target = %target, "received target state");
        self.inner.pending_target.send_replace(Some(target));

        let current = self.inner.cache.get();
        if let Err(e) = policy::check_transition(current.as_deref(), target) {
            self.inner.pending_target.send_replace(None);
            warn!(target = %target, "Can't arm system. System is not ready.");
            return Err(e);
        }

        info!(target = %target, "setting state");
        let engine = self.clone();
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while in_flight.try_join_next().is_some() {}
        in_flight.spawn(async move {
            if let Err(e) = engine.inner.client.change_state(target).await {
                warn!(target = %target, error = %e, "state change request failed");
            }
        });
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Store a fresh snapshot and push it to subscribers.
    fn publish(&self, snapshot: StatusSnapshot) -> Arc<StatusSnapshot> {
        let stored = self.inner.cache.set(snapshot);

        self.inner.pending_target.send_if_modified(|pending| {
            if *pending == Some(stored.target_state) {
                *pending = None;
                true
            } else {
                false
            }
        });

        self.inner.published.send_replace(Some(Arc::clone(&stored)));
        stored
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.inner.state.send_replace(state);
    }
}
