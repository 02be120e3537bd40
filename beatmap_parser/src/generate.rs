use beatmap_model::{keys, BeatmapModel, HitObject, Metadata, Millis, TimingPoint, LANE_COUNT};
use serde_json::Value;

use crate::GENERATED_BY;

/// Difficulty at and above which a generated chart is labelled "Hard".
const HARD_FROM: f64 = 0.7;

/// Parameters of a beat-grid chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternOptions {
    pub bpm: f64,
    /// Length of the grid in seconds.
    pub duration_secs: f64,
    /// `0.0..=1.0`; raises the subdivision and fills the even off-beats above 0.5.
    pub difficulty: f64,
    /// Lanes the pattern cycles through, `1..=LANE_COUNT`.
    pub lanes: u8,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            duration_secs: 30.0,
            difficulty: 0.6,
            lanes: LANE_COUNT as u8,
        }
    }
}

impl PatternOptions {
    fn beat_length_ms(&self) -> Option<f64> {
        (self.bpm.is_finite() && self.bpm > 0.0).then(|| 60_000.0 / self.bpm)
    }
}

/// Lays taps on a fixed beat grid.
///
/// Every beat carries a tap on its downbeat. The beat is split into
/// `2 + floor(difficulty * 3)` steps, and above difficulty 0.5 every even
/// step also gets a tap. Lanes rotate by beat and step.
pub fn generate_pattern(options: &PatternOptions) -> Vec<HitObject> {
    let Some(beat_ms) = options.beat_length_ms() else {
        log::warn!("bpm {} cannot drive a beat grid", options.bpm);
        return Vec::new();
    };
    let difficulty = options.difficulty.clamp(0.0, 1.0);
    let lanes = u64::from(options.lanes.clamp(1, LANE_COUNT as u8));
    let steps = 2 + (difficulty * 3.0) as u64;
    let beats = (options.duration_secs.max(0.0) * options.bpm / 60.0) as u64;

    let mut notes = Vec::new();
    for beat in 0..beats {
        let beat_time = beat as f64 * beat_ms;
        for step in 0..steps {
            if step != 0 && !(difficulty > 0.5 && step % 2 == 0) {
                continue;
            }
            let time = beat_time + step as f64 * beat_ms / steps as f64;
            let lane = (beat + step) % lanes;
            notes.push(HitObject::tap(time as Millis, lane as i64));
        }
    }
    notes
}

/// A complete chart for `audio_filename`, titled after its file stem.
pub fn generate_beatmap(audio_filename: &str, options: &PatternOptions) -> BeatmapModel {
    let title = std::path::Path::new(audio_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(audio_filename);
    let difficulty = if options.difficulty < HARD_FROM {
        "Normal"
    } else {
        "Hard"
    };

    let mut metadata = Metadata::new();
    metadata.insert(keys::TITLE.to_string(), Value::from(title));
    metadata.insert(keys::ARTIST.to_string(), Value::from("Generated"));
    metadata.insert(keys::AUDIO_FILENAME.to_string(), Value::from(audio_filename));
    metadata.insert(keys::DIFFICULTY.to_string(), Value::from(difficulty));
    metadata.insert(keys::LANES.to_string(), Value::from(options.lanes));
    metadata.insert(keys::GENERATED_BY.to_string(), Value::from(GENERATED_BY));
    if options.beat_length_ms().is_some() {
        metadata.insert(keys::BPM.to_string(), Value::from(options.bpm));
    }

    let hit_objects = generate_pattern(options);
    let mut model = BeatmapModel {
        metadata,
        timing_points: options
            .beat_length_ms()
            .map(|beat_length_ms| TimingPoint {
                time_ms: 0,
                beat_length_ms,
                meter: 4,
                is_uninherited: true,
            })
            .into_iter()
            .collect(),
        hit_objects,
        source_dir: None,
    };
    let length_ms = model.last_time_ms();
    model
        .metadata
        .insert(keys::DURATION.to_string(), Value::from(length_ms));
    model
}
