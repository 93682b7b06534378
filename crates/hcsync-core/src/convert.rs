// ── API-to-domain conversions ──
//
// Bridges the loosely-typed JSON the hub returns into canonical
// `hcsync_core::model` types. Missing or mistyped fields fall back to
// sentinels instead of failing; only a non-object description is an error.

use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Device, DeviceId, DeviceKind, StateChange, TemperatureSensor};

/// `type` discriminator of temperature sensors.
pub const TEMPERATURE_SENSOR_TYPE: &str = "com.fibaro.temperatureSensor";

/// Name given to devices whose description has no usable `name`.
pub const NAME_FALLBACK: &str = "name_error";

/// Unit given to sensors whose description has no usable `unit`.
pub const UNIT_FALLBACK: &str = "unit_error";

// ── Helpers ────────────────────────────────────────────────────────

/// Read a numeric value the hub may encode either as a JSON number or as
/// a numeric string (`"22.93"`). Non-finite values (`"NaN"`, `"inf"`) are
/// rejected.
fn parse_reading(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

/// The `type` discriminator of a description, if present and not null.
///
/// The bulk loader skips descriptions for which this is `None`.
pub fn discriminator(description: &Value) -> Option<&Value> {
    description.get("type").filter(|t| !t.is_null())
}

// ── Device factory ─────────────────────────────────────────────────

/// Build a [`Device`] from a raw hub description.
///
/// A `type` equal to [`TEMPERATURE_SENSOR_TYPE`] yields a temperature
/// sensor seeded with `properties.value`; anything else yields a generic
/// device. Fails only when `description` is not a JSON object.
pub fn device_from_description(description: &Value) -> Result<Device, CoreError> {
    let Some(fields) = description.as_object() else {
        return Err(CoreError::Validation {
            message: format!("expected a JSON object, got {}", json_kind(description)),
        });
    };

    let id = fields
        .get("id")
        .and_then(Value::as_i64)
        .map_or(DeviceId::UNIDENTIFIED, DeviceId::new);
    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(NAME_FALLBACK);
    let enabled = fields
        .get("enabled")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let kind = match fields.get("type").and_then(Value::as_str) {
        Some(TEMPERATURE_SENSOR_TYPE) => {
            DeviceKind::TemperatureSensor(sensor_from_properties(id, fields.get("properties")))
        }
        _ => DeviceKind::Generic,
    };

    Ok(Device::new(id, name, enabled, kind))
}

fn sensor_from_properties(id: DeviceId, properties: Option<&Value>) -> TemperatureSensor {
    let properties = properties.and_then(Value::as_object);

    let unit = properties
        .and_then(|p| p.get("unit"))
        .and_then(Value::as_str)
        .unwrap_or(UNIT_FALLBACK);

    let raw_value = properties.and_then(|p| p.get("value"));
    let initial = raw_value.and_then(parse_reading);
    if initial.is_none() {
        debug!(%id, value = ?raw_value, "sensor has no usable initial reading");
    }

    TemperatureSensor::new(unit, initial)
}

// ── Change-set entries ─────────────────────────────────────────────

/// Decode one `changes` entry. Entries lacking an integer `id` or a
/// numeric `value` (e.g. property-only changes) yield `None`.
pub fn change_from_value(entry: &Value) -> Option<StateChange> {
    let id = entry.get("id").and_then(Value::as_i64)?;
    let value = entry.get("value").and_then(parse_reading)?;
    Some(StateChange::new(id, value))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
