// ── Status store ──
//
// Single-entry TTL cache with push-based lifecycle events.

mod cache;

pub use cache::{CacheEntry, CacheEvent, STATUS_KEY, StatusCache};
