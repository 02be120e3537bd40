use std::{fs, path::Path};

use beatmap_model::{keys, BeatmapModel, LANE_COUNT};
use serde_json::Value;

mod error;
mod generate;
mod native;
mod osu;

pub use error::{ParseError, ParseErrorKind, ValidationError};
pub use generate::{generate_beatmap, generate_pattern, PatternOptions};
pub use native::{from_model, into_model, to_json_string};

/// Provenance stamped into `metadata.generated_by` when a file carries none.
pub const GENERATED_BY: &str = "beatmap_parser";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    #[default]
    Auto,
    Native,
    Osu,
}

impl FormatHint {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Native,
            Some("osu") => Self::Osu,
            _ => Self::Auto,
        }
    }

    fn resolve(self, src: &str) -> Self {
        match self {
            Self::Auto if src.trim_start_matches('\u{feff}').trim_start().starts_with('{') => {
                Self::Native
            }
            Self::Auto => Self::Osu,
            other => other,
        }
    }
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<BeatmapModel, ParseError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        ParseError::new("E2001", format!("failed to read beatmap: {e}"), 0)
            .with_file(path.display().to_string())
    })?;

    let mut model = parse(&src, FormatHint::from_path(path))
        .map_err(|e| e.with_file(path.display().to_string()))?;
    model.source_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);
    Ok(model)
}

/// Parses either beatmap format into the canonical model.
///
/// Only an unreadable native document is an error; damaged fields and lines
/// degrade to defaults. Empty input yields an empty model.
pub fn parse(src: &str, hint: FormatHint) -> Result<BeatmapModel, ParseError> {
    if src.trim_start_matches('\u{feff}').trim().is_empty() {
        return Ok(BeatmapModel::default());
    }

    let format = hint.resolve(src);
    let mut model = match format {
        FormatHint::Native => native::parse_native(src)?,
        _ => osu::parse_osu(src),
    };
    finish(&mut model, format);
    Ok(model)
}

fn finish(model: &mut BeatmapModel, format: FormatHint) {
    model.sort_hit_objects();

    let meta = &mut model.metadata;
    meta.entry(keys::GENERATED_BY.to_string())
        .or_insert_with(|| Value::from(GENERATED_BY));
    if format == FormatHint::Osu {
        meta.entry(keys::LANES.to_string())
            .or_insert_with(|| Value::from(LANE_COUNT as u64));
    }

    if !model.metadata.contains_key(keys::BPM) {
        if let Some(bpm) = model.timing_points.iter().find_map(|tp| tp.bpm()) {
            model.metadata.insert(keys::BPM.to_string(), Value::from(bpm));
        }
    }
}

/// Structural check run before a song may start.
pub fn check(model: &BeatmapModel) -> Result<(), ValidationError> {
    if model.metadata.is_empty() {
        return Err(ValidationError::MissingMetadata);
    }
    if model.hit_objects.is_empty() {
        return Err(ValidationError::NoHitObjects);
    }
    if model.audio_filename().is_none() {
        return Err(ValidationError::MissingAudioFilename);
    }
    Ok(())
}

pub fn validate(model: &BeatmapModel) -> bool {
    check(model).is_ok()
}
