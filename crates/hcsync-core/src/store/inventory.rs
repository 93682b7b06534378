// ── Inventory bulk load ──
//
// Builds the registry from the full `/api/devices` snapshot. Malformed
// entries are dropped and counted, never surfaced as errors.

use serde_json::Value;
use tracing::{debug, warn};

use super::DeviceRegistry;
use crate::convert::{device_from_description, discriminator};

/// Counts from one [`DeviceRegistry::load_inventory`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Devices stored (new slots plus replacements).
    pub loaded: usize,
    /// Entries without a `type`, or not JSON objects.
    pub skipped: usize,
    /// Entries that overwrote an earlier entry with the same id.
    pub replaced: usize,
    /// Devices stored under the unidentified sentinel id.
    pub unidentified: usize,
}

impl DeviceRegistry {
    /// Build devices from raw hub descriptions and store them.
    ///
    /// Duplicate ids are last-write-wins: the later description replaces
    /// the earlier device but keeps its position in traversal order.
    /// Publishes a snapshot when done.
    pub fn load_inventory(&mut self, descriptions: &[Value]) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for description in descriptions {
            if discriminator(description).is_none() {
                debug!(id = ?description.get("id"), "skipping description without type");
                summary.skipped += 1;
                continue;
            }

            let device = match device_from_description(description) {
                Ok(device) => device,
                Err(e) => {
                    debug!(error = %e, "skipping malformed description");
                    summary.skipped += 1;
                    continue;
                }
            };

            let id = device.id();
            summary.loaded += 1;

            if !id.is_identified() {
                summary.unidentified += 1;
                self.devices.push(device);
                continue;
            }

            if let Some(&slot) = self.index.get(&id) {
                warn!(%id, "duplicate device id in inventory, keeping the later entry");
                summary.replaced += 1;
                if let Some(existing) = self.devices.get_mut(slot) {
                    *existing = device;
                }
            } else {
                self.index.insert(id, self.devices.len());
                self.devices.push(device);
            }
        }

        debug!(?summary, "inventory loaded");
        self.publish();
        summary
    }
}
