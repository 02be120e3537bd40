pub mod config;
pub mod engine;
pub mod events;
pub mod lane;
pub mod note;
pub mod score;

pub use config::EngineConfig;
pub use engine::{JudgementEngine, SessionPhase, SongResult, StartError};
pub use events::{ChannelListener, GameEvent, GameEventListener, NullListener};
pub use lane::{JudgementResult, Lane};
pub use note::{InvalidTransition, Note, NoteId, NotePool, NoteState};
pub use score::{SessionStats, Tier, COMBO_BONUS_PER_STEP};
