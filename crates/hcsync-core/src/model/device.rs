// ── Device domain types ──

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Hub-assigned numeric device identifier.
///
/// Devices whose description carried no usable id get
/// [`DeviceId::UNIDENTIFIED`]; they are listed but never receive updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(i64);

impl DeviceId {
    pub const UNIDENTIFIED: Self = Self(-1);

    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn is_identified(self) -> bool {
        self != Self::UNIDENTIFIED
    }
}

impl From<i64> for DeviceId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bounded FIFO of the most recent readings, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingHistory {
    readings: VecDeque<f64>,
}

impl ReadingHistory {
    pub const CAPACITY: usize = 24;

    pub fn new() -> Self {
        Self {
            readings: VecDeque::with_capacity(Self::CAPACITY),
        }
    }

    /// Append a reading, evicting the oldest once full.
    pub fn push(&mut self, reading: f64) {
        if self.readings.len() == Self::CAPACITY {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    /// Most recently pushed reading.
    pub fn current(&self) -> Option<f64> {
        self.readings.back().copied()
    }

    /// Arithmetic mean of the retained readings.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn average(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let sum: f64 = self.readings.iter().sum();
        Some(sum / self.readings.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().copied()
    }
}

/// Temperature sensor state: unit plus recent readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSensor {
    unit: String,
    history: ReadingHistory,
}

impl TemperatureSensor {
    pub fn new(unit: impl Into<String>, initial: Option<f64>) -> Self {
        let mut history = ReadingHistory::new();
        if let Some(reading) = initial {
            history.push(reading);
        }
        Self {
            unit: unit.into(),
            history,
        }
    }

    /// Physical unit of the readings. Not checked against updates.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn history(&self) -> &ReadingHistory {
        &self.history
    }

    pub fn current(&self) -> Option<f64> {
        self.history.current()
    }

    pub fn average(&self) -> Option<f64> {
        self.history.average()
    }
}

/// Capability-specific part of a device. Closed: adding a kind means
/// extending every match on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceKind {
    /// Any device type the mirror does not model. Ignores updates.
    Generic,
    TemperatureSensor(TemperatureSensor),
}

impl DeviceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::TemperatureSensor(_) => "temperature sensor",
        }
    }
}

/// A device mirrored from the hub.
///
/// Identity and kind are fixed at construction; the only way to change
/// a device afterwards is [`update_state`](Self::update_state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    id: DeviceId,
    name: String,
    enabled: bool,
    #[serde(flatten)]
    kind: DeviceKind,
}

impl Device {
    pub fn new(id: DeviceId, name: impl Into<String>, enabled: bool, kind: DeviceKind) -> Self {
        Self {
            id,
            name: name.into(),
            enabled,
            kind,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// The sensor state, if this device is a temperature sensor.
    pub fn as_temperature_sensor(&self) -> Option<&TemperatureSensor> {
        match &self.kind {
            DeviceKind::TemperatureSensor(sensor) => Some(sensor),
            DeviceKind::Generic => None,
        }
    }

    /// Apply a value reported by the hub. Returns `true` if the device
    /// state changed.
    pub fn update_state(&mut self, value: f64) -> bool {
        match &mut self.kind {
            DeviceKind::Generic => {
                trace!(id = %self.id, "generic device state cannot be updated");
                false
            }
            DeviceKind::TemperatureSensor(sensor) => {
                sensor.history.push(value);
                true
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.enabled { "enabled" } else { "disabled" };
        write!(f, "[{}]: {} is {state}.", self.id, self.name)
    }
}
