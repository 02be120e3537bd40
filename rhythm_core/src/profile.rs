use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::gameplay::SongResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub plays: u32,
    pub best_score: u64,
    pub best_accuracy: f64,
    pub best_max_combo: u32,
}

/// Cross-session progress. The caller owns it and feeds it finished results;
/// the engine never touches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_name: String,
    pub total_plays: u32,
    /// Keyed by song title.
    pub songs: BTreeMap<String, SongRecord>,
}

impl PlayerProfile {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }

    /// Folds one result in. Returns true when it set a new best score.
    pub fn record_result(&mut self, result: &SongResult) -> bool {
        self.total_plays += 1;
        let record = self.songs.entry(result.title.clone()).or_default();
        record.plays += 1;
        record.best_accuracy = record.best_accuracy.max(result.accuracy);
        record.best_max_combo = record.best_max_combo.max(result.stats.max_combo);

        let improved = result.final_score > record.best_score;
        if improved {
            log::info!(
                "new best on \"{}\": {} -> {}",
                result.title,
                record.best_score,
                result.final_score
            );
            record.best_score = result.final_score;
        }
        improved
    }

    pub fn record_for(&self, title: &str) -> Option<&SongRecord> {
        self.songs.get(title)
    }

    pub fn best_score(&self, title: &str) -> u64 {
        self.record_for(title).map_or(0, |r| r.best_score)
    }
}
