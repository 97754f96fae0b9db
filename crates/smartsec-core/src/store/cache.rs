// ── Single-entry status cache with TTL ──
//
// Holds at most one snapshot under the fixed "status" key. Every `set`
// re-arms a one-shot expiry timer; when it fires the entry is evicted
// and exactly one `Expired` event is broadcast for it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::model::StatusSnapshot;

/// Key of the only entry the cache ever holds.
pub const STATUS_KEY: &str = "status";

const EVENT_CHANNEL_SIZE: usize = 16;

/// The live cache entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Arc<StatusSnapshot>,
    pub inserted_at: DateTime<Utc>,
    pub ttl: Duration,
    stored_at: Instant,
    generation: u64,
}

impl CacheEntry {
    pub fn key(&self) -> &'static str {
        STATUS_KEY
    }

    /// Time since this entry was stored.
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    fn expires_at(&self) -> Instant {
        self.stored_at + self.ttl
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at()
    }
}

/// Lifecycle notifications emitted by [`StatusCache`].
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A snapshot was stored (and the TTL clock restarted).
    Set(Arc<StatusSnapshot>),
    /// The entry outlived its TTL and was evicted.
    Expired(Arc<StatusSnapshot>),
}

/// Time-bounded holder for the current status snapshot.
///
/// Readers either get the live value or wait for the next `set` via
/// [`wait_for_value`](Self::wait_for_value). The expiry timer runs on a
/// background task owned by the cache and stops when the cache is dropped.
pub struct StatusCache {
    inner: Arc<CacheInner>,
    cancel: CancellationToken,
}

struct CacheInner {
    ttl: Duration,
    entry: watch::Sender<Option<CacheEntry>>,
    events: broadcast::Sender<CacheEvent>,
    generation: AtomicU64,
}

impl StatusCache {
    /// Create an empty cache and start its expiry timer task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(ttl: Duration) -> Self {
        let (entry, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let inner = Arc::new(CacheInner {
            ttl,
            entry,
            events,
            generation: AtomicU64::new(0),
        });
        let cancel = CancellationToken::new();
        tokio::spawn(expiry_task(Arc::clone(&inner), cancel.clone()));
        Self { inner, cancel }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Store `snapshot`, restart the TTL clock, and wake blocked readers.
    pub fn set(&self, snapshot: StatusSnapshot) -> Arc<StatusSnapshot> {
        let value = Arc::new(snapshot);
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.entry.send_replace(Some(CacheEntry {
            value: Arc::clone(&value),
            inserted_at: Utc::now(),
            ttl: self.inner.ttl,
            stored_at: Instant::now(),
            generation,
        }));
        trace!(key = STATUS_KEY, generation, "cache set");
        let _ = self.inner.events.send(CacheEvent::Set(Arc::clone(&value)));
        value
    }

    /// The live snapshot, or `None` if the cache is empty or stale.
    pub fn get(&self) -> Option<Arc<StatusSnapshot>> {
        self.inner
            .entry
            .borrow()
            .as_ref()
            .filter(|e| e.is_fresh())
            .map(|e| Arc::clone(&e.value))
    }

    /// The live entry with its bookkeeping.
    pub fn entry(&self) -> Option<CacheEntry> {
        self.inner.entry.borrow().clone().filter(CacheEntry::is_fresh)
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }

    /// Drop the entry without emitting `Expired`.
    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::Relaxed);
        self.inner.entry.send_replace(None);
    }

    /// Return the live snapshot, or wait for the next `set`.
    ///
    /// There is no timeout. Dropping the returned future deregisters the wait.
    pub async fn wait_for_value(&self) -> Arc<StatusSnapshot> {
        let mut rx = self.inner.entry.subscribe();
        let found = rx
            .wait_for(|slot| slot.as_ref().is_some_and(CacheEntry::is_fresh))
            .await
            .ok()
            .and_then(|slot| slot.as_ref().map(|e| Arc::clone(&e.value)));
        match found {
            Some(value) => value,
            // The sender lives as long as `self`; unreachable in practice.
            None => std::future::pending().await,
        }
    }

    /// Subscribe to `Set` / `Expired` lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }
}

impl Drop for StatusCache {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl CacheInner {
    /// Evict the entry if it is still the one the timer was armed for.
    fn expire(&self, generation: u64) {
        let mut evicted = None;
        self.entry.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|e| e.generation == generation) {
                evicted = slot.take().map(|e| e.value);
                true
            } else {
                false
            }
        });

        if let Some(value) = evicted {
            debug!(key = STATUS_KEY, "entry expired");
            let _ = self.events.send(CacheEvent::Expired(value));
        }
    }
}

// ── Background task ──────────────────────────────────────────────

/// One-shot timer per entry: re-armed whenever the entry changes.
async fn expiry_task(inner: Arc<CacheInner>, cancel: CancellationToken) {
    let mut rx = inner.entry.subscribe();

    loop {
        let armed = rx
            .borrow_and_update()
            .as_ref()
            .map(|e| (e.expires_at(), e.generation));

        match armed {
            None => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = rx.changed() => if changed.is_err() { break },
                }
            }
            Some((deadline, generation)) => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = rx.changed() => if changed.is_err() { break },
                    () = tokio::time::sleep_until(deadline) => inner.expire(generation),
                }
            }
        }
    }

    trace!("cache expiry task stopped");
}
