use beatmap_model::{BeatmapModel, HitObject, Metadata, Millis, TimingPoint, DEFAULT_HOLD_DURATION_MS};
use serde_json::Value;

/// Playfield x positions of the four lanes, left to right.
pub(crate) const LANE_POSITIONS: [f64; 4] = [64.0, 192.0, 320.0, 448.0];

const HOLD_BIT: i64 = 4;
const MANIA_HOLD_BIT: i64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Metadata,
    Difficulty,
    TimingPoints,
    HitObjects,
    Other,
}

impl Section {
    fn from_header(name: &str) -> Self {
        match name {
            "General" => Self::General,
            "Metadata" => Self::Metadata,
            "Difficulty" => Self::Difficulty,
            "TimingPoints" => Self::TimingPoints,
            "HitObjects" => Self::HitObjects,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Text,
    Integer,
    Decimal,
}

struct FieldSpec {
    section: Section,
    name: &'static str,
    key: &'static str,
    kind: FieldKind,
}

const fn field(section: Section, name: &'static str, key: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { section, name, key, kind }
}

const FIELD_TABLE: &[FieldSpec] = &[
    field(Section::General, "AudioFilename", "audio_filename", FieldKind::Text),
    field(Section::General, "AudioLeadIn", "audio_lead_in", FieldKind::Integer),
    field(Section::General, "PreviewTime", "preview_time", FieldKind::Integer),
    field(Section::General, "Mode", "mode", FieldKind::Integer),
    field(Section::Metadata, "Title", "title", FieldKind::Text),
    field(Section::Metadata, "TitleUnicode", "title_unicode", FieldKind::Text),
    field(Section::Metadata, "Artist", "artist", FieldKind::Text),
    field(Section::Metadata, "ArtistUnicode", "artist_unicode", FieldKind::Text),
    field(Section::Metadata, "Creator", "creator", FieldKind::Text),
    field(Section::Metadata, "Version", "difficulty", FieldKind::Text),
    field(Section::Metadata, "Source", "source", FieldKind::Text),
    field(Section::Metadata, "Tags", "tags", FieldKind::Text),
    field(Section::Metadata, "BeatmapID", "beatmap_id", FieldKind::Integer),
    field(Section::Difficulty, "HPDrainRate", "hp_drain_rate", FieldKind::Decimal),
    field(Section::Difficulty, "CircleSize", "circle_size", FieldKind::Decimal),
    field(Section::Difficulty, "OverallDifficulty", "overall_difficulty", FieldKind::Decimal),
    field(Section::Difficulty, "ApproachRate", "approach_rate", FieldKind::Decimal),
];

pub(crate) fn parse_osu(src: &str) -> BeatmapModel {
    let mut model = BeatmapModel::default();
    let mut section = Section::Other;

    for (i, raw_line) in src.lines().enumerate() {
        let line_no = i + 1;
        let line = raw_line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            section = Section::from_header(name.trim());
            continue;
        }

        match section {
            Section::General | Section::Metadata | Section::Difficulty => {
                parse_field(&mut model.metadata, section, line, line_no);
            }
            Section::TimingPoints => {
                if let Some(tp) = parse_timing_point(line, line_no) {
                    model.timing_points.push(tp);
                }
            }
            Section::HitObjects => {
                if let Some(obj) = parse_hit_object(line, line_no) {
                    model.hit_objects.push(obj);
                }
            }
            Section::Other => {}
        }
    }

    model
}

fn parse_field(metadata: &mut Metadata, section: Section, line: &str, line_no: usize) {
    let Some((name, value)) = line.split_once(':') else {
        log::warn!("line {line_no}: expected `Key: Value`, skipping");
        return;
    };
    let name = name.trim();
    let value = value.trim();

    let Some(spec) = FIELD_TABLE
        .iter()
        .find(|f| f.section == section && f.name == name)
    else {
        return;
    };

    let value = match spec.kind {
        FieldKind::Text => Value::from(value),
        FieldKind::Integer => Value::from(int_field(value)),
        FieldKind::Decimal => Value::from(float_field(value)),
    };
    metadata.insert(spec.key.to_string(), value);
}

fn parse_timing_point(line: &str, line_no: usize) -> Option<TimingPoint> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 2 {
        log::warn!("line {line_no}: timing point needs at least time and beat length");
        return None;
    }

    Some(TimingPoint {
        time_ms: int_field(parts[0]),
        beat_length_ms: float_field(parts[1]),
        meter: parts.get(2).map_or(4, |s| int_field(s).max(0) as u32),
        is_uninherited: parts.get(6).map_or(true, |s| int_field(s) != 0),
    })
}

/// Decodes `x,y,time,type,hitSound,objectParams,...`.
fn parse_hit_object(line: &str, line_no: usize) -> Option<HitObject> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        log::warn!("line {line_no}: hit object has no time field, skipping");
        return None;
    }

    let lane = nearest_lane(float_field(parts[0])) as i64;
    let time_ms = int_field(parts[2]);
    let type_bits = parts.get(3).map_or(0, |s| int_field(s));

    if type_bits & (HOLD_BIT | MANIA_HOLD_BIT) != 0 {
        let duration = hold_duration(parts.get(5).copied(), time_ms);
        Some(HitObject::hold(time_ms, lane, duration))
    } else {
        Some(HitObject::tap(time_ms, lane))
    }
}

/// Hold length from the `endTime:...` object parameter, if it names a later time.
fn hold_duration(params: Option<&str>, time_ms: Millis) -> Millis {
    let end_ms = params
        .and_then(|p| p.split(':').next())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .map(|f| f as Millis);

    match end_ms {
        Some(end) if end > time_ms.max(0) => end - time_ms.max(0),
        _ => DEFAULT_HOLD_DURATION_MS,
    }
}

/// Index of the closest lane position; ties go to the lower lane.
pub(crate) fn nearest_lane(x: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, pos) in LANE_POSITIONS.iter().enumerate() {
        let dist = (x - pos).abs();
        if dist < best_dist {
            best = idx;
            best_dist = dist;
        }
    }
    best
}

fn int_field(s: &str) -> i64 {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        .unwrap_or(0)
}

fn float_field(s: &str) -> f64 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}
