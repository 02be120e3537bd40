use std::collections::BTreeMap;

use beatmap_model::{HitKind, HitObject};
use serde::Serialize;
use thiserror::Error;

use crate::Millis;

/// Index of the hit object a note was spawned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NoteId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NoteState {
    /// Created this tick, not yet eligible.
    Spawning,
    Moving,
    Hit,
    Missed,
    Destroyed,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot {action} note in state {from:?}")]
pub struct InvalidTransition {
    pub from: NoteState,
    pub action: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub lane: u8,
    pub kind: HitKind,
    pub target_time_ms: Millis,
    pub hold_duration_ms: Millis,
    state: NoteState,
    spawned_at_ms: Option<Millis>,
    time_diff_ms: Option<Millis>,
}

impl Note {
    pub fn new(id: NoteId, obj: &HitObject) -> Self {
        Self {
            id,
            lane: obj.lane,
            kind: obj.kind,
            target_time_ms: obj.time_ms,
            hold_duration_ms: obj.hold_duration_ms,
            state: NoteState::Spawning,
            spawned_at_ms: None,
            time_diff_ms: None,
        }
    }

    pub fn state(&self) -> NoteState {
        self.state
    }

    /// Song time at which the note started moving; presentation only.
    pub fn spawned_at_ms(&self) -> Option<Millis> {
        self.spawned_at_ms
    }

    /// Absolute deviation of the input that hit this note.
    pub fn time_diff_ms(&self) -> Option<Millis> {
        self.time_diff_ms
    }

    pub fn is_moving(&self) -> bool {
        self.state == NoteState::Moving
    }

    pub fn is_judged(&self) -> bool {
        matches!(self.state, NoteState::Hit | NoteState::Missed)
    }

    pub fn begin_moving(&mut self, now_ms: Millis) -> Result<(), InvalidTransition> {
        self.transition(NoteState::Spawning, NoteState::Moving, "start moving")?;
        self.spawned_at_ms = Some(now_ms);
        Ok(())
    }

    pub fn hit(&mut self, time_diff_ms: Millis) -> Result<(), InvalidTransition> {
        self.transition(NoteState::Moving, NoteState::Hit, "hit")?;
        self.time_diff_ms = Some(time_diff_ms.abs());
        Ok(())
    }

    pub fn miss(&mut self) -> Result<(), InvalidTransition> {
        self.transition(NoteState::Moving, NoteState::Missed, "miss")
    }

    pub fn destroy(&mut self) -> Result<(), InvalidTransition> {
        if !self.is_judged() {
            return Err(InvalidTransition {
                from: self.state,
                action: "destroy",
            });
        }
        self.state = NoteState::Destroyed;
        Ok(())
    }

    /// True once an unhit note is more than `miss_after_ms` past its target.
    pub fn is_overdue(&self, now_ms: Millis, miss_after_ms: Millis) -> bool {
        self.is_moving() && now_ms - self.target_time_ms > miss_after_ms
    }

    pub fn end_time_ms(&self) -> Millis {
        self.target_time_ms.saturating_add(self.hold_duration_ms)
    }

    /// Whether a hit Hold's body is being played through at `time_ms`.
    pub fn is_active_at(&self, time_ms: Millis) -> bool {
        self.kind == HitKind::Hold
            && self.state == NoteState::Hit
            && (self.target_time_ms..=self.end_time_ms()).contains(&time_ms)
    }

    /// Fraction of the hold body elapsed at `time_ms`, in `[0, 1]`.
    pub fn hold_progress(&self, time_ms: Millis) -> f64 {
        if time_ms < self.target_time_ms {
            return 0.0;
        }
        if self.kind != HitKind::Hold || self.hold_duration_ms == 0 {
            return 1.0;
        }
        let elapsed = (time_ms - self.target_time_ms) as f64;
        (elapsed / self.hold_duration_ms as f64).clamp(0.0, 1.0)
    }

    fn transition(
        &mut self,
        from: NoteState,
        to: NoteState,
        action: &'static str,
    ) -> Result<(), InvalidTransition> {
        if self.state != from {
            return Err(InvalidTransition {
                from: self.state,
                action,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Owner of every live note in a session, keyed by id (and so by target time).
#[derive(Debug, Default)]
pub struct NotePool {
    notes: BTreeMap<NoteId, Note>,
}

impl NotePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, note: Note) {
        self.notes.insert(note.id, note);
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.get_mut(&id)
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        self.notes.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        self.notes.values_mut()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Drops every note that has reached `Destroyed`.
    pub fn sweep_destroyed(&mut self) {
        self.notes.retain(|_, n| n.state() != NoteState::Destroyed);
    }
}
