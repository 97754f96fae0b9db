// ── Domain model ──
//
// Typed alarm state shared by the cache, the engine, and the
// characteristic bridge.

mod status;

pub use status::{ArmingState, FaultStatus, LowBatteryStatus, StatusSnapshot, TargetState};
