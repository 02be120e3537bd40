//! Timing and judgement core for a 4-lane rhythm game.
//!
//! The [`gameplay::JudgementEngine`] owns a parsed beatmap for one session,
//! spawns notes ahead of an [`time::AudioClock`], matches lane input against
//! them and keeps score. Audio output, rendering and persistence stay outside;
//! the engine talks to them through [`audio::AudioBackend`] and
//! [`gameplay::GameEventListener`].

pub mod audio;
pub mod gameplay;
pub mod input;
pub mod profile;
pub mod time;

pub use beatmap_model::Millis;
