use serde::{Deserialize, Serialize};

use crate::Millis;

/// Points added to the final score per step of the session's peak combo.
pub const COMBO_BONUS_PER_STEP: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Perfect,
    Great,
    Good,
}

impl Tier {
    pub const PERFECT_MS: Millis = 50;
    pub const GREAT_MS: Millis = 100;
    pub const GOOD_MS: Millis = 150;

    /// Fixed ladder, independent of the configured hit window.
    pub fn from_time_diff(time_diff_ms: Millis) -> Option<Self> {
        match time_diff_ms.abs() {
            d if d <= Self::PERFECT_MS => Some(Tier::Perfect),
            d if d <= Self::GREAT_MS => Some(Tier::Great),
            d if d <= Self::GOOD_MS => Some(Tier::Good),
            _ => None,
        }
    }

    pub fn points(self) -> u64 {
        match self {
            Tier::Perfect => 300,
            Tier::Great => 200,
            Tier::Good => 100,
        }
    }

    pub fn accuracy_weight(self) -> f64 {
        match self {
            Tier::Perfect => 1.0,
            Tier::Great => 0.7,
            Tier::Good => 0.4,
        }
    }
}

/// Per-session counters. `perfect + great + good + miss` never exceeds `total_notes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Running sum of tier points; the combo bonus is only added by [`final_score`](Self::final_score).
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
    pub total_notes: u32,
}

impl SessionStats {
    pub fn new(total_notes: u32) -> Self {
        Self {
            total_notes,
            ..Self::default()
        }
    }

    /// Returns the points awarded.
    pub fn record_hit(&mut self, tier: Tier) -> u64 {
        match tier {
            Tier::Perfect => self.perfect += 1,
            Tier::Great => self.great += 1,
            Tier::Good => self.good += 1,
        }
        self.score += tier.points();
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        tier.points()
    }

    pub fn record_miss(&mut self) {
        self.miss += 1;
        self.combo = 0;
    }

    pub fn notes_judged(&self) -> u32 {
        self.perfect + self.great + self.good + self.miss
    }

    pub fn all_judged(&self) -> bool {
        self.notes_judged() >= self.total_notes
    }

    /// Weighted hit percentage over all notes in the map, 0 for an empty map.
    pub fn accuracy(&self) -> f64 {
        if self.total_notes == 0 {
            return 0.0;
        }
        let weighted = self.perfect as f64 * Tier::Perfect.accuracy_weight()
            + self.great as f64 * Tier::Great.accuracy_weight()
            + self.good as f64 * Tier::Good.accuracy_weight();
        weighted / self.total_notes as f64 * 100.0
    }

    pub fn final_score(&self) -> u64 {
        self.score + u64::from(self.max_combo) * COMBO_BONUS_PER_STEP
    }
}
