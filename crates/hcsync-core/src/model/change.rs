use serde::{Deserialize, Serialize};

use super::device::DeviceId;

/// One `{id, value}` entry of a refresh change-set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub id: DeviceId,
    pub value: f64,
}

impl StateChange {
    pub fn new(id: impl Into<DeviceId>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}
