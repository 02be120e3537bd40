use beatmap_model::Metadata;
use crossbeam_channel::Sender;
use serde::Serialize;

use super::score::{SessionStats, Tier};
use crate::Millis;

/// Everything the engine reports outward, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    SongStarted {
        metadata: Metadata,
    },
    NoteJudged {
        lane: u8,
        tier: Tier,
        points: u64,
        time_diff_ms: Millis,
    },
    NoteMissed {
        lane: u8,
    },
    ComboChanged {
        combo: u32,
        max_combo: u32,
    },
    /// Cosmetic hook fired on every multiple of the configured milestone.
    ComboMilestone {
        combo: u32,
    },
    ScoreChanged {
        score: u64,
    },
    SongFinished {
        final_score: u64,
        stats: SessionStats,
        accuracy: f64,
    },
}

/// Receives engine events synchronously on the game thread.
pub trait GameEventListener {
    fn on_event(&mut self, event: &GameEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl GameEventListener for NullListener {
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Forwards events to another thread (UI, effects, persistence).
///
/// Once the receiving side hangs up, later events are dropped.
#[derive(Debug)]
pub struct ChannelListener {
    tx: Sender<GameEvent>,
    disconnected: bool,
}

impl ChannelListener {
    pub fn new(tx: Sender<GameEvent>) -> Self {
        Self {
            tx,
            disconnected: false,
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl From<Sender<GameEvent>> for ChannelListener {
    fn from(tx: Sender<GameEvent>) -> Self {
        Self::new(tx)
    }
}

impl GameEventListener for ChannelListener {
    fn on_event(&mut self, event: &GameEvent) {
        if self.disconnected {
            return;
        }
        if self.tx.send(event.clone()).is_err() {
            log::warn!("event receiver disconnected, dropping further game events");
            self.disconnected = true;
        }
    }
}
