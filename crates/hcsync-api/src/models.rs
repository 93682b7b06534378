// Hub response models
//
// Device descriptions stay loosely typed (`serde_json::Value`): the hub
// reports dozens of per-type fields and mixes numeric and string encodings,
// so typing happens in the core's device factory instead. Informational
// fields decode leniently; a mistyped one becomes `None` or empty.

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `GET /api/refreshStates` (no cursor).
///
/// Only `last` is required; the remaining fields describe the hub's
/// status and recent log entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatus {
    /// Cursor to pass as `last` in the first incremental refresh.
    #[serde(deserialize_with = "cursor")]
    pub last: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    /// Unix timestamp (seconds) of the hub clock.
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
    /// Human-readable hub date string.
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub logs: Vec<Value>,
}

impl RefreshStatus {
    /// The hub clock as a UTC timestamp, if reported and in range.
    pub fn hub_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

/// Response of `GET /api/refreshStates?last=<cursor>`.
///
/// `changes` entries are kept raw; entries without an integer `id` or a
/// numeric `value` are dropped by the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<Value>,
    /// Updated cursor, when the hub supplies a usable one.
    #[serde(default, deserialize_with = "lenient_cursor")]
    pub last: Option<i64>,
}

// ── Field decoders ─────────────────────────────────────────────────

/// Integer cursor; integral floats such as `12.0` are accepted.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn cursor_from_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract().abs() > 0.0 || !(-9.0e18..=9.0e18).contains(&f) {
        return None;
    }
    Some(f as i64)
}

fn cursor<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    cursor_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("expected an integer cursor, got {value}")))
}

fn lenient_cursor<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(cursor_from_value(&value))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}
