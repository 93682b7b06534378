// ── Device registry ──
//
// Id-indexed device storage owned by the session, with a `watch`
// snapshot published after every inventory load or applied change-set.

mod inventory;
mod registry;

pub use inventory::LoadSummary;
pub use registry::{DeviceRegistry, UpdateOutcome};
