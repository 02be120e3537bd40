use beatmap_model::native::{NativeBeatmap, NativeHitObject, NativeKind, NativeTimingPoint};
use beatmap_model::{BeatmapModel, HitKind, HitObject, TimingPoint, DEFAULT_HOLD_DURATION_MS, LANE_COUNT};

use crate::ParseError;

pub(crate) fn parse_native(src: &str) -> Result<BeatmapModel, ParseError> {
    let native: NativeBeatmap = serde_json::from_str(src).map_err(|e| {
        ParseError::new("E1001", format!("invalid native beatmap: {e}"), e.line())
    })?;
    Ok(into_model(native))
}

pub fn into_model(native: NativeBeatmap) -> BeatmapModel {
    let timing_points = native
        .timing_points
        .into_iter()
        .map(|tp| TimingPoint {
            time_ms: tp.time,
            beat_length_ms: tp.beat_length,
            meter: tp.meter,
            is_uninherited: tp.uninherited,
        })
        .collect();

    let hit_objects = native
        .hit_objects
        .into_iter()
        .map(|obj| {
            if !(0..LANE_COUNT as i64).contains(&obj.lane) {
                log::debug!("lane {} at {}ms clamped into range", obj.lane, obj.time);
            }
            match obj.kind {
                NativeKind::Hold => HitObject::hold(
                    obj.time,
                    obj.lane,
                    obj.duration.unwrap_or(DEFAULT_HOLD_DURATION_MS),
                ),
                NativeKind::Tap | NativeKind::Special => HitObject::tap(obj.time, obj.lane),
            }
        })
        .collect();

    BeatmapModel {
        metadata: native.metadata,
        timing_points,
        hit_objects,
        source_dir: None,
    }
}

/// Re-expresses a model in the native schema, whatever format it came from.
pub fn from_model(model: &BeatmapModel) -> NativeBeatmap {
    NativeBeatmap {
        metadata: model.metadata.clone(),
        timing_points: model
            .timing_points
            .iter()
            .map(|tp| NativeTimingPoint {
                time: tp.time_ms,
                beat_length: tp.beat_length_ms,
                meter: tp.meter,
                uninherited: tp.is_uninherited,
            })
            .collect(),
        hit_objects: model
            .hit_objects
            .iter()
            .map(|h| NativeHitObject {
                time: h.time_ms,
                lane: i64::from(h.lane),
                kind: match h.kind {
                    HitKind::Tap => NativeKind::Tap,
                    HitKind::Hold => NativeKind::Hold,
                },
                duration: match h.kind {
                    HitKind::Tap => None,
                    HitKind::Hold => Some(h.hold_duration_ms),
                },
            })
            .collect(),
    }
}

pub fn to_json_string(model: &BeatmapModel) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&from_model(model))
}
