use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::Millis;

pub mod audio_clock;

pub use audio_clock::{AudioClock, ClockState, DEFAULT_DRIFT_THRESHOLD_MS};

/// Wall clock used to cross-check the audio stream.
pub trait TimeSource {
    /// Milliseconds since an arbitrary, fixed origin. Must be monotonic.
    fn now_ms(&self) -> Millis;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Hand-driven time; clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Arc<AtomicI64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: Millis) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }

    pub fn set(&self, ms: Millis) {
        self.now.store(ms, Ordering::Release);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::Acquire)
    }
}
