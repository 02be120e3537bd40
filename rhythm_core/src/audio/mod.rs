use std::path::Path;

use crate::Millis;

pub mod manual;
pub mod stream;

pub use manual::ManualAudio;
pub use stream::{StreamBackend, StreamFeed, TransportCommand};

/// Transport over whatever actually plays the song.
///
/// The judgement core never decodes audio; it only needs a stream position and
/// the usual transport controls. Implementations must not block.
pub trait AudioBackend {
    fn load(&mut self, path: &Path) -> anyhow::Result<()>;
    fn is_loaded(&self) -> bool;

    fn play(&mut self, start_ms: Millis);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);

    /// Position reported by the audio stream, `None` while nothing is playing.
    fn position_ms(&self) -> Option<Millis>;
    /// Length of the loaded song, 0 when unknown.
    fn duration_ms(&self) -> Millis;

    /// Volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);
}
