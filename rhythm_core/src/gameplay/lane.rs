use serde::Serialize;

use super::config::EngineConfig;
use super::note::{Note, NoteId, NotePool};
use super::score::Tier;
use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JudgementResult {
    pub note: NoteId,
    pub lane: u8,
    pub tier: Tier,
    /// `input - target`; negative means early.
    pub time_diff_ms: Millis,
    pub input_time_ms: Millis,
}

/// One input channel and the notes currently judgeable on it.
///
/// Holds ids only; the engine's [`NotePool`] owns the notes.
#[derive(Debug, Clone)]
pub struct Lane {
    index: u8,
    hit_window_ms: Millis,
    miss_after_ms: Millis,
    active: Vec<NoteId>,
    combo: u32,
}

impl Lane {
    pub fn new(index: u8, config: &EngineConfig) -> Self {
        Self {
            index,
            hit_window_ms: config.hit_window_ms,
            miss_after_ms: config.miss_after_ms(),
            active: Vec::new(),
            combo: 0,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Lane-local streak; the engine's combo is authoritative.
    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn active_notes(&self) -> &[NoteId] {
        &self.active
    }

    /// Refuses notes that belong to another lane.
    pub fn register(&mut self, note: &Note) -> bool {
        if note.lane != self.index {
            log::warn!(
                "note {:?} for lane {} offered to lane {}",
                note.id,
                note.lane,
                self.index
            );
            return false;
        }
        self.active.push(note.id);
        true
    }

    /// Matches a key press against the earliest eligible Moving note.
    ///
    /// An input with nothing in range is ignored; misses only come from
    /// [`check_missed_notes`](Self::check_missed_notes).
    pub fn on_input(&mut self, input_time_ms: Millis, notes: &mut NotePool) -> Option<JudgementResult> {
        let (pos, tier, time_diff_ms) = self
            .active
            .iter()
            .enumerate()
            .filter_map(|(pos, id)| {
                let note = notes.get(*id)?;
                if !note.is_moving() {
                    return None;
                }
                let diff = input_time_ms - note.target_time_ms;
                if diff.abs() > self.hit_window_ms {
                    return None;
                }
                let tier = Tier::from_time_diff(diff)?;
                Some((pos, tier, diff, note.target_time_ms))
            })
            .min_by_key(|&(pos, _, _, target)| (target, pos))
            .map(|(pos, tier, diff, _)| (pos, tier, diff))?;

        let id = self.active.remove(pos);
        let note = notes.get_mut(id)?;
        if let Err(e) = note.hit(time_diff_ms) {
            log::debug!("lane {}: {e}", self.index);
            return None;
        }
        self.combo += 1;

        Some(JudgementResult {
            note: id,
            lane: self.index,
            tier,
            time_diff_ms,
            input_time_ms,
        })
    }

    /// Turns every Moving note past `hit window + grace` into a miss, oldest first.
    pub fn check_missed_notes(&mut self, now_ms: Millis, notes: &mut NotePool) -> Vec<NoteId> {
        let miss_after_ms = self.miss_after_ms;
        let mut missed = Vec::new();

        self.active.retain(|id| match notes.get_mut(*id) {
            Some(note) if note.is_overdue(now_ms, miss_after_ms) => {
                if note.miss().is_ok() {
                    missed.push(*id);
                }
                false
            }
            Some(_) => true,
            None => false,
        });

        if !missed.is_empty() {
            self.combo = 0;
        }
        missed
    }

    /// Misses a specific note regardless of time, if it is still Moving here.
    pub fn force_miss(&mut self, id: NoteId, notes: &mut NotePool) -> bool {
        let Some(pos) = self.active.iter().position(|n| *n == id) else {
            return false;
        };
        let Some(note) = notes.get_mut(id) else {
            return false;
        };
        if let Err(e) = note.miss() {
            log::debug!("lane {}: {e}", self.index);
            return false;
        }
        self.active.remove(pos);
        self.combo = 0;
        true
    }

    pub fn reset(&mut self) {
        self.active.clear();
        self.combo = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatmap_model::HitObject;

    fn lane_with(objs: &[HitObject], config: &EngineConfig) -> (Lane, NotePool) {
        let mut lane = Lane::new(0, config);
        let mut pool = NotePool::new();
        for (idx, obj) in objs.iter().enumerate() {
            let mut note = Note::new(NoteId(idx), obj);
            note.begin_moving(0).unwrap();
            assert!(lane.register(&note));
            pool.insert(note);
        }
        (lane, pool)
    }

    #[test]
    fn wrong_lane_is_refused() {
        let mut lane = Lane::new(1, &EngineConfig::default());
        let note = Note::new(NoteId(0), &HitObject::tap(100, 2));
        assert!(!lane.register(&note));
        assert!(lane.active_notes().is_empty());
    }

    #[test]
    fn earliest_target_wins_when_two_qualify() {
        let config = EngineConfig::default();
        let (mut lane, mut pool) = lane_with(&[HitObject::tap(1000, 0), HitObject::tap(1100, 0)], &config);

        let result = lane.on_input(1060, &mut pool).unwrap();
        assert_eq!(result.note, NoteId(0));
        assert_eq!(result.tier, Tier::Great);
        assert_eq!(result.time_diff_ms, 60);

        let result = lane.on_input(1090, &mut pool).unwrap();
        assert_eq!(result.note, NoteId(1));
        assert_eq!(result.tier, Tier::Perfect);
        assert_eq!(result.time_diff_ms, -10);
        assert_eq!(lane.combo(), 2);
    }

    #[test]
    fn narrow_window_makes_good_unreachable() {
        let config = EngineConfig {
            hit_window_ms: 120,
            ..EngineConfig::default()
        };
        let (mut lane, mut pool) = lane_with(&[HitObject::tap(1000, 0)], &config);

        assert!(lane.on_input(1130, &mut pool).is_none());
        let result = lane.on_input(1110, &mut pool).unwrap();
        assert_eq!(result.tier, Tier::Good);
    }

    #[test]
    fn wide_window_still_needs_a_tier() {
        let config = EngineConfig {
            hit_window_ms: 200,
            ..EngineConfig::default()
        };
        let (mut lane, mut pool) = lane_with(&[HitObject::tap(1000, 0)], &config);
        assert!(lane.on_input(1180, &mut pool).is_none());
        assert_eq!(lane.active_notes().len(), 1);
    }

    #[test]
    fn force_miss_resets_lane_combo() {
        let config = EngineConfig::default();
        let (mut lane, mut pool) = lane_with(&[HitObject::tap(500, 0), HitObject::tap(900, 0)], &config);
        lane.on_input(500, &mut pool).unwrap();
        assert!(lane.force_miss(NoteId(1), &mut pool));
        assert!(!lane.force_miss(NoteId(1), &mut pool));
        assert_eq!(lane.combo(), 0);
        assert!(lane.active_notes().is_empty());
    }
}
