//! Error types for the game core

use thiserror::Error;

/// Errors surfaced synchronously to the presentation layer.
///
/// None of these are retried internally; re-prompting is up to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// A key index outside the keyboard
    #[error("Invalid key index {index}: keyboard has {key_count} keys")]
    InvalidInput { index: usize, key_count: usize },

    /// An action or query issued from a phase that forbids it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rejected game configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
