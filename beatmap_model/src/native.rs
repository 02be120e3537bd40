//! Native JSON beatmap schema.
//!
//! Decoding is lenient on purpose: a garbled field becomes its zero value and an
//! unreadable list entry is dropped, so one bad value never rejects a whole file.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::Metadata;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeBeatmap {
    #[serde(default, deserialize_with = "lenient_map")]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub timing_points: Vec<NativeTimingPoint>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub hit_objects: Vec<NativeHitObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeTimingPoint {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub time: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub beat_length: f64,
    #[serde(default = "default_meter", deserialize_with = "lenient_u32")]
    pub meter: u32,
    #[serde(default = "default_uninherited", deserialize_with = "lenient_bool")]
    pub uninherited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeHitObject {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub time: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub lane: i64,
    #[serde(rename = "type", default)]
    pub kind: NativeKind,
    #[serde(
        default,
        deserialize_with = "lenient_opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeKind {
    #[default]
    Tap,
    Hold,
    /// Emitted by the converter tooling; judged like a tap.
    Special,
}

impl NativeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NativeKind::Tap => "tap",
            NativeKind::Hold => "hold",
            NativeKind::Special => "special",
        }
    }
}

impl Serialize for NativeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NativeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = match value.as_str().map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "hold" => NativeKind::Hold,
            Some(s) if s == "special" => NativeKind::Special,
            _ => NativeKind::Tap,
        };
        Ok(kind)
    }
}

fn default_meter() -> u32 {
    4
}

fn default_uninherited() -> bool {
    true
}

fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| number_of(&value) as i64),
        _ => number_of(&value) as i64,
    })
}

fn lenient_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(number_of(&value) as i64))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number_of(&value).max(0.0) as u32)
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let n = number_of(&value);
    Ok(if n.is_finite() { n } else { 0.0 })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Bool(b) => *b,
        Value::String(s) if s.eq_ignore_ascii_case("true") => true,
        _ => number_of(&value) != 0.0,
    })
}

fn lenient_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Metadata, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(Metadata::new()),
        other => {
            log::warn!("metadata is not an object ({other}); using empty metadata");
            Ok(Metadata::new())
        }
    }
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            log::warn!("expected a list, found {other}; ignoring");
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(v) => out.push(v),
            Err(e) => log::warn!("skipping unreadable entry #{idx}: {e}"),
        }
    }
    Ok(out)
}
