use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod native;

pub type Millis = i64;

/// Number of input lanes the judgement core is built around.
pub const LANE_COUNT: usize = 4;

/// Duration given to a Hold whose source carries no usable length.
pub const DEFAULT_HOLD_DURATION_MS: Millis = 1000;

/// Free-form song metadata, keyed by the names in [`keys`].
pub type Metadata = BTreeMap<String, Value>;

/// Well-known metadata keys shared by both beatmap formats.
pub mod keys {
    pub const TITLE: &str = "title";
    pub const ARTIST: &str = "artist";
    pub const AUDIO_FILENAME: &str = "audio_filename";
    pub const BPM: &str = "bpm";
    pub const LANES: &str = "lanes";
    pub const DIFFICULTY: &str = "difficulty";
    pub const DURATION: &str = "duration";
    pub const GENERATED_BY: &str = "generated_by";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Tap,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitObject {
    pub time_ms: Millis,
    pub lane: u8,
    pub kind: HitKind,
    /// Always 0 for taps.
    pub hold_duration_ms: Millis,
}

impl HitObject {
    pub fn tap(time_ms: Millis, lane: i64) -> Self {
        Self {
            time_ms: time_ms.max(0),
            lane: clamp_lane(lane),
            kind: HitKind::Tap,
            hold_duration_ms: 0,
        }
    }

    pub fn hold(time_ms: Millis, lane: i64, hold_duration_ms: Millis) -> Self {
        Self {
            time_ms: time_ms.max(0),
            lane: clamp_lane(lane),
            kind: HitKind::Hold,
            hold_duration_ms: hold_duration_ms.max(0),
        }
    }

    pub fn end_time_ms(&self) -> Millis {
        self.time_ms.saturating_add(self.hold_duration_ms)
    }
}

/// Maps any raw lane value into `0..LANE_COUNT`.
pub fn clamp_lane(raw: i64) -> u8 {
    raw.clamp(0, LANE_COUNT as i64 - 1) as u8
}

/// Used for BPM display only; judgement never reads timing points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingPoint {
    pub time_ms: Millis,
    pub beat_length_ms: f64,
    pub meter: u32,
    pub is_uninherited: bool,
}

impl TimingPoint {
    pub fn bpm(&self) -> Option<f64> {
        if self.is_uninherited && self.beat_length_ms > 0.0 {
            Some(60_000.0 / self.beat_length_ms)
        } else {
            None
        }
    }
}

/// Canonical in-memory beatmap. Built once by the parser, read-only for a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatmapModel {
    pub metadata: Metadata,
    pub timing_points: Vec<TimingPoint>,
    pub hit_objects: Vec<HitObject>,
    /// Directory the beatmap was read from; audio filenames resolve against it.
    pub source_dir: Option<PathBuf>,
}

impl BeatmapModel {
    pub fn text(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        self.text(keys::TITLE).unwrap_or("")
    }

    pub fn artist(&self) -> &str {
        self.text(keys::ARTIST).unwrap_or("")
    }

    /// Audio filename, or `None` when missing or blank.
    pub fn audio_filename(&self) -> Option<&str> {
        self.text(keys::AUDIO_FILENAME)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn audio_path(&self) -> Option<PathBuf> {
        let name = self.audio_filename()?;
        Some(match &self.source_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        })
    }

    pub fn bpm(&self) -> Option<f64> {
        self.number(keys::BPM)
            .or_else(|| self.timing_points.iter().find_map(TimingPoint::bpm))
    }

    /// BPM of the last uninherited timing point at or before `time_ms`.
    pub fn bpm_at(&self, time_ms: Millis) -> Option<f64> {
        let mut current = None;
        for tp in &self.timing_points {
            if tp.time_ms > time_ms {
                break;
            }
            if let Some(bpm) = tp.bpm() {
                current = Some(bpm);
            }
        }
        current.or_else(|| self.bpm())
    }

    pub fn hold_count(&self) -> usize {
        self.hit_objects
            .iter()
            .filter(|h| h.kind == HitKind::Hold)
            .count()
    }

    /// End of the last hit object, holds included.
    pub fn last_time_ms(&self) -> Millis {
        self.hit_objects
            .iter()
            .map(HitObject::end_time_ms)
            .max()
            .unwrap_or(0)
    }

    /// Stable sort: objects sharing a timestamp keep their file order.
    pub fn sort_hit_objects(&mut self) {
        self.hit_objects.sort_by_key(|h| h.time_ms);
        self.timing_points.sort_by_key(|tp| tp.time_ms);
    }

    pub fn is_sorted(&self) -> bool {
        self.hit_objects
            .windows(2)
            .all(|w| w[0].time_ms <= w[1].time_ms)
    }
}
