use crate::audio::AudioBackend;
use crate::time::{SystemTimeSource, TimeSource};
use crate::Millis;

/// Past this much disagreement the wall-clock estimate wins over the stream.
pub const DEFAULT_DRIFT_THRESHOLD_MS: Millis = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Playing,
    Paused,
}

/// Song position in milliseconds, reconciled from two sources.
///
/// The stream position is accurate over long stretches but updates in buffer
/// sized steps and lags right after a seek or resume; the wall-clock estimate
/// (`now - session_start`) is smooth but drifts. Small disagreements trust the
/// stream, large ones trust the wall clock.
pub struct AudioClock<B, T = SystemTimeSource> {
    backend: B,
    time: T,
    offset_ms: Millis,
    drift_threshold_ms: Millis,
    state: ClockState,
    /// Wall time at which song position 0 played (or would have).
    session_start_ms: Millis,
    paused_at_ms: Millis,
}

impl<B: AudioBackend, T: TimeSource> AudioClock<B, T> {
    pub fn new(backend: B, time: T) -> Self {
        Self {
            backend,
            time,
            offset_ms: 0,
            drift_threshold_ms: DEFAULT_DRIFT_THRESHOLD_MS,
            state: ClockState::Stopped,
            session_start_ms: 0,
            paused_at_ms: 0,
        }
    }

    pub fn with_drift_threshold_ms(mut self, threshold_ms: Millis) -> Self {
        self.drift_threshold_ms = threshold_ms.max(0);
        self
    }

    /// Starts playback `start_ms` into the song.
    pub fn start(&mut self, start_ms: Millis) {
        self.backend.play(start_ms);
        self.session_start_ms = self.time.now_ms() - start_ms;
        self.state = ClockState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state != ClockState::Playing {
            return;
        }
        self.paused_at_ms = self.time.now_ms();
        self.backend.pause();
        self.state = ClockState::Paused;
    }

    /// Shifts the session start by the paused interval so position stays continuous.
    pub fn resume(&mut self) {
        if self.state != ClockState::Paused {
            return;
        }
        self.session_start_ms += self.time.now_ms() - self.paused_at_ms;
        self.backend.resume();
        self.state = ClockState::Playing;
    }

    pub fn stop(&mut self) {
        if self.state != ClockState::Stopped {
            self.backend.stop();
            self.state = ClockState::Stopped;
        }
    }

    /// Positive values delay where the player perceives the audio.
    pub fn set_offset_ms(&mut self, offset_ms: Millis) {
        self.offset_ms = offset_ms;
    }

    pub fn offset_ms(&self) -> Millis {
        self.offset_ms
    }

    /// 0 until something is loaded and playback has started.
    pub fn position_ms(&self) -> Millis {
        if !self.backend.is_loaded() || self.state == ClockState::Stopped {
            return 0;
        }

        let now = match self.state {
            ClockState::Paused => self.paused_at_ms,
            _ => self.time.now_ms(),
        };
        let wall_ms = now - self.session_start_ms;

        let position = match self.backend.position_ms() {
            Some(stream_ms) if (stream_ms - wall_ms).abs() <= self.drift_threshold_ms => stream_ms,
            _ => wall_ms,
        };
        position + self.offset_ms
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == ClockState::Playing
    }

    pub fn duration_ms(&self) -> Millis {
        self.backend.duration_ms()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}
