use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::Millis;

/// Tunables for one engine. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Half-width of the window in which an input may match a note.
    pub hit_window_ms: Millis,
    /// Extra time past the hit window before an untouched note is missed.
    pub miss_grace_ms: Millis,
    /// Lead time between a note spawning and its target time.
    pub note_travel_ms: Millis,
    /// Output latency compensation added to the clock.
    pub audio_offset_ms: Millis,
    pub drift_threshold_ms: Millis,
    /// Nominal period between simulation ticks (~60 Hz).
    pub tick_interval_ms: Millis,
    pub combo_milestone_every: u32,
    /// Stop on our own once every note is judged and the audio has ended.
    pub auto_finish: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_window_ms: 150,
            miss_grace_ms: 200,
            note_travel_ms: 2000,
            audio_offset_ms: 0,
            drift_threshold_ms: 100,
            tick_interval_ms: 16,
            combo_milestone_every: 10,
            auto_finish: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse engine config")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config: {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Age past target at which a Moving note turns into a miss.
    pub fn miss_after_ms(&self) -> Millis {
        self.hit_window_ms.saturating_add(self.miss_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"hit_window_ms": 120, "audio_offset_ms": -15}"#).unwrap();
        assert_eq!(cfg.hit_window_ms, 120);
        assert_eq!(cfg.audio_offset_ms, -15);
        assert_eq!(cfg.note_travel_ms, 2000);
        assert_eq!(cfg.miss_after_ms(), 320);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = EngineConfig::from_json_str("{ hit_window_ms: }").unwrap_err();
        assert!(err.to_string().contains("engine config"));
    }
}
