use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use parking_lot::Mutex;

use super::AudioBackend;
use crate::Millis;

#[derive(Debug)]
struct ManualState {
    loaded: Option<PathBuf>,
    fail_load: bool,
    started: bool,
    playing: bool,
    position_ms: Millis,
    duration_ms: Millis,
    volume: f32,
}

/// Backend whose stream position only moves when told to.
///
/// Clones share state, so a test or offline simulation can keep a handle while
/// the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualAudio {
    state: Arc<Mutex<ManualState>>,
}

impl Default for ManualAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualAudio {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                loaded: None,
                fail_load: false,
                started: false,
                playing: false,
                position_ms: 0,
                duration_ms: 0,
                volume: 1.0,
            })),
        }
    }

    pub fn with_duration_ms(duration_ms: Millis) -> Self {
        let audio = Self::new();
        audio.state.lock().duration_ms = duration_ms;
        audio
    }

    /// A backend whose every `load` fails, as with a corrupt file.
    pub fn failing() -> Self {
        let audio = Self::new();
        audio.state.lock().fail_load = true;
        audio
    }

    /// Moves the stream forward; ignored unless playing.
    pub fn advance(&self, ms: Millis) {
        let mut state = self.state.lock();
        if state.playing {
            state.position_ms += ms;
        }
    }

    pub fn set_position_ms(&self, position_ms: Millis) {
        self.state.lock().position_ms = position_ms;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn loaded_path(&self) -> Option<PathBuf> {
        self.state.lock().loaded.clone()
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }
}

impl AudioBackend for ManualAudio {
    fn load(&mut self, path: &Path) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        if state.fail_load {
            bail!("failed to decode audio: {}", path.display());
        }
        state.loaded = Some(path.to_path_buf());
        state.started = false;
        state.playing = false;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.state.lock().loaded.is_some()
    }

    fn play(&mut self, start_ms: Millis) {
        let mut state = self.state.lock();
        state.position_ms = start_ms;
        state.started = true;
        state.playing = true;
    }

    fn pause(&mut self) {
        self.state.lock().playing = false;
    }

    fn resume(&mut self) {
        let mut state = self.state.lock();
        state.playing = state.started;
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.started = false;
        state.playing = false;
    }

    fn position_ms(&self) -> Option<Millis> {
        let state = self.state.lock();
        (state.loaded.is_some() && state.started).then_some(state.position_ms)
    }

    fn duration_ms(&self) -> Millis {
        self.state.lock().duration_ms
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }
}
