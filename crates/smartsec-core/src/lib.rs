//! State synchronization between a remote security panel and accessory
//! consumers (the `smartsec` CLI or a home-automation host).
//!
//! - **[`StateSyncEngine`]**: Owns the lifecycle for one panel:
//!   [`init()`](StateSyncEngine::init) logs in, seeds the cache, and arms a
//!   refresh listener that re-fetches status whenever the cached snapshot
//!   expires. Reads are served from the cache; writes are forwarded to the
//!   device fire-and-forget, guarded by the not-ready policy.
//!
//! - **[`StatusCache`]**: Single-entry cache with a TTL. Expiry is the poll
//!   clock: each `Expired` event drives exactly one refresh.
//!
//! - **[`DeviceClient`]**: The seam to the device. [`PortalDevice`] talks to
//!   the hosted portal through `smartsec-api`; tests substitute scripted
//!   clients.
//!
//! - **[`SecuritySystemAccessory`]**: Accessory-facing getters, setter, and
//!   change callbacks, plus [`characteristic_updates`] for pushing snapshots
//!   to a host.

pub mod accessory;
pub mod client;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use accessory::{
    AccessoryInformation, Characteristic, CharacteristicUpdate, SecuritySystemAccessory,
    characteristic_updates,
};
pub use client::{DeviceClient, PortalDevice};
pub use config::{DEFAULT_CACHE_TTL_SECS, EngineConfig, TlsVerification};
pub use engine::{ConnectionState, StateSyncEngine};
pub use error::CoreError;
pub use model::{ArmingState, FaultStatus, LowBatteryStatus, StatusSnapshot, TargetState};
pub use store::{CacheEntry, CacheEvent, StatusCache};
pub use stream::StatusStream;
