// ── Domain model ──
//
// Canonical device types mirrored from the hub, plus the per-device
// state change carried by a refresh change-set.

pub mod change;
pub mod device;

pub use change::StateChange;
pub use device::{Device, DeviceId, DeviceKind, ReadingHistory, TemperatureSensor};
