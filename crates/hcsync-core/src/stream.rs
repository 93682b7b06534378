// ── Device snapshot subscriptions ──

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::Device;

/// A subscription to the registry's published device list.
///
/// Provides point-in-time snapshot access plus change notification via
/// [`changed()`](Self::changed). Readers never observe a half-applied
/// change-set: snapshots are only rebuilt once a whole set is applied.
pub struct DeviceStream {
    current: Arc<Vec<Device>>,
    receiver: watch::Receiver<Arc<Vec<Device>>>,
}

impl DeviceStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Device>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &Arc<Vec<Device>> {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Device>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot.
    /// Returns `None` once the registry has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Device>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
