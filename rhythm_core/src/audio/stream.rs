use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::bail;
use atomic_float::AtomicF64;
use crossbeam_channel::{unbounded, Receiver, Sender};

use super::AudioBackend;
use crate::Millis;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    Load(PathBuf),
    Play { start_ms: Millis },
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
}

/// Audio-thread end of a [`StreamBackend`].
///
/// The output callback drains transport commands and publishes how far into the
/// song it has rendered.
pub struct StreamFeed {
    command_rx: Receiver<TransportCommand>,
    position_secs: Arc<AtomicF64>,
    duration_ms: Arc<AtomicI64>,
}

impl StreamFeed {
    /// Non-blocking. Returns None if no command is pending.
    pub fn try_recv(&self) -> Option<TransportCommand> {
        self.command_rx.try_recv().ok()
    }

    pub fn publish_position(&self, secs: f64) {
        self.position_secs.store(secs, Ordering::Release);
    }

    pub fn publish_duration_ms(&self, duration_ms: Millis) {
        self.duration_ms.store(duration_ms, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Idle,
    Running,
    Paused,
}

/// Game-thread end: forwards transport calls to the audio thread and reads back
/// the stream position it publishes.
pub struct StreamBackend {
    command_tx: Sender<TransportCommand>,
    position_secs: Arc<AtomicF64>,
    duration_ms: Arc<AtomicI64>,
    loaded: Option<PathBuf>,
    transport: Transport,
}

impl StreamBackend {
    pub fn new() -> (Self, StreamFeed) {
        let (tx, rx) = unbounded();
        let position_secs = Arc::new(AtomicF64::new(0.0));
        let duration_ms = Arc::new(AtomicI64::new(0));
        (
            Self {
                command_tx: tx,
                position_secs: position_secs.clone(),
                duration_ms: duration_ms.clone(),
                loaded: None,
                transport: Transport::Idle,
            },
            StreamFeed {
                command_rx: rx,
                position_secs,
                duration_ms,
            },
        )
    }

    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded.as_deref()
    }

    fn send(&self, cmd: TransportCommand) {
        if let Err(e) = self.command_tx.send(cmd) {
            log::debug!("audio feed gone, dropped {:?}", e.into_inner());
        }
    }
}

impl AudioBackend for StreamBackend {
    fn load(&mut self, path: &Path) -> anyhow::Result<()> {
        if !path.is_file() {
            bail!("audio file not found: {}", path.display());
        }
        if self
            .command_tx
            .send(TransportCommand::Load(path.to_path_buf()))
            .is_err()
        {
            bail!("audio thread is not running");
        }
        self.loaded = Some(path.to_path_buf());
        self.transport = Transport::Idle;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn play(&mut self, start_ms: Millis) {
        self.position_secs
            .store(start_ms as f64 / 1000.0, Ordering::Release);
        self.send(TransportCommand::Play { start_ms });
        self.transport = Transport::Running;
    }

    fn pause(&mut self) {
        if self.transport == Transport::Running {
            self.send(TransportCommand::Pause);
            self.transport = Transport::Paused;
        }
    }

    fn resume(&mut self) {
        if self.transport == Transport::Paused {
            self.send(TransportCommand::Resume);
            self.transport = Transport::Running;
        }
    }

    fn stop(&mut self) {
        if self.transport != Transport::Idle {
            self.send(TransportCommand::Stop);
            self.transport = Transport::Idle;
        }
    }

    fn position_ms(&self) -> Option<Millis> {
        if self.loaded.is_none() || self.transport == Transport::Idle {
            return None;
        }
        let secs = self.position_secs.load(Ordering::Acquire);
        Some((secs * 1000.0).round() as Millis)
    }

    fn duration_ms(&self) -> Millis {
        self.duration_ms.load(Ordering::Acquire)
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(TransportCommand::SetVolume(volume.clamp(0.0, 1.0)));
    }
}
