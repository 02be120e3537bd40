pub mod events;

use beatmap_model::LANE_COUNT;
use serde::{Deserialize, Serialize};

pub use self::events::InputEvent;

/// Key-to-lane table, left lane first. Matching ignores ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneBindings {
    keys: [char; LANE_COUNT],
}

impl Default for LaneBindings {
    fn default() -> Self {
        Self {
            keys: ['d', 'f', 'j', 'k'],
        }
    }
}

impl LaneBindings {
    pub fn new(keys: [char; LANE_COUNT]) -> Self {
        Self { keys }
    }

    /// Parses a layout such as `"dfjk"`; needs exactly one key per lane.
    pub fn from_layout(layout: &str) -> Option<Self> {
        let chars: Vec<char> = layout.chars().collect();
        let keys: [char; LANE_COUNT] = chars.try_into().ok()?;
        Some(Self { keys })
    }

    pub fn lane_for(&self, key: char) -> Option<u8> {
        self.keys
            .iter()
            .position(|k| k.eq_ignore_ascii_case(&key))
            .map(|idx| idx as u8)
    }

    pub fn key_for(&self, lane: u8) -> Option<char> {
        self.keys.get(lane as usize).copied()
    }
}
