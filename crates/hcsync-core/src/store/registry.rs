use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::model::{Device, DeviceId, StateChange};
use crate::stream::DeviceStream;

/// What happened to a single routed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The device accepted the value and its state changed.
    Applied,
    /// The device exists but its kind ignores updates.
    Unchanged,
    /// No device with that id (or the id is the unidentified sentinel).
    Unknown,
}

/// Owns every device mirrored from the hub.
///
/// Storage is a `Vec` in insertion order plus an id → slot index, so
/// traversal follows the inventory order and lookups are O(1). Devices
/// without a usable id are stored for display but never indexed.
///
/// Mutation happens only through [`apply`](Self::apply), which routes a
/// value to the matching device's `update_state`. Subscribers see changes
/// once [`publish`](Self::publish) rebuilds the snapshot.
pub struct DeviceRegistry {
    pub(super) devices: Vec<Device>,
    pub(super) index: HashMap<DeviceId, usize>,
    snapshot: watch::Sender<Arc<Vec<Device>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            devices: Vec::new(),
            index: HashMap::new(),
            snapshot,
        }
    }

    /// Look up a device by id. Unknown ids are not an error.
    pub fn find(&self, id: DeviceId) -> Option<&Device> {
        let slot = *self.index.get(&id)?;
        self.devices.get(slot)
    }

    /// Route one change to its device.
    pub fn apply(&mut self, change: StateChange) -> UpdateOutcome {
        let Some(device) = self
            .index
            .get(&change.id)
            .copied()
            .and_then(|slot| self.devices.get_mut(slot))
        else {
            trace!(id = %change.id, "change for unknown device ignored");
            return UpdateOutcome::Unknown;
        };

        if device.update_state(change.value) {
            trace!(id = %change.id, value = change.value, "device updated");
            UpdateOutcome::Applied
        } else {
            UpdateOutcome::Unchanged
        }
    }

    /// Devices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> + '_ {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Rebuild the snapshot and notify subscribers.
    pub fn publish(&self) {
        let values = Arc::new(self.devices.clone());
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = values);
    }

    /// The last published snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Device>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to published snapshots.
    pub fn subscribe(&self) -> DeviceStream {
        DeviceStream::new(self.snapshot.subscribe())
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
