// tune-core/src/lib.rs

//! The core logic for the Tune ear-training game.
//! This crate owns the pitch model, the adaptive round engine, scoring,
//! and the narrow interfaces to audio playback and score storage. It is
//! completely headless and contains no GUI code.

pub mod audio;
pub mod config;
pub mod error;
pub mod pitch;
pub mod random;
pub mod round;
pub mod score;
pub mod session;
pub mod storage;

pub use config::{ErrorMode, GameConfig};
pub use error::{GameError, GameResult};
pub use pitch::{KEY_COUNT, NoteIndex};
pub use round::{Answer, Outcome, Phase, RoundEngine};
pub use score::Score;
pub use session::{Feedback, Session};
