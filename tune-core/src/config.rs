//! # Game Configuration
//!
//! Difficulty curve and octave selection. Every field has a default, so a
//! config file only needs the values it overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Starting error fraction of every game.
pub const BASE_ERROR: f64 = 0.25;

/// Multiplier applied to the error after each correct guess.
pub const RAMP_FACTOR: f64 = 0.9;

/// Lowest and highest octave the keyboard can be transposed to.
pub const OCTAVE_RANGE: std::ops::RangeInclusive<i8> = 0..=8;

/// How the sign of the error is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// The target key always plays sharp.
    Unsigned,
    /// A coin flip decides sharp or flat each round.
    #[default]
    Signed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub base_error: f64,
    pub ramp_factor: f64,
    pub error_mode: ErrorMode,
    /// Scientific octave numbers a round may be played in.
    pub octaves: Vec<i8>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_error: BASE_ERROR,
            ramp_factor: RAMP_FACTOR,
            error_mode: ErrorMode::Signed,
            octaves: vec![crate::pitch::BASE_OCTAVE],
        }
    }
}

impl GameConfig {
    /// Loads and validates a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GameResult<()> {
        if !(self.base_error > 0.0 && self.base_error <= 1.0) {
            return Err(GameError::InvalidConfig(format!(
                "base_error must be in (0, 1], got {}",
                self.base_error
            )));
        }
        if !(self.ramp_factor > 0.0 && self.ramp_factor < 1.0) {
            return Err(GameError::InvalidConfig(format!(
                "ramp_factor must be in (0, 1), got {}",
                self.ramp_factor
            )));
        }
        if self.octaves.is_empty() {
            return Err(GameError::InvalidConfig("no octave selected".into()));
        }
        if let Some(octave) = self.octaves.iter().find(|&&o| !OCTAVE_RANGE.contains(&o)) {
            return Err(GameError::InvalidConfig(format!(
                "octave {octave} outside {}..={}",
                OCTAVE_RANGE.start(),
                OCTAVE_RANGE.end()
            )));
        }
        Ok(())
    }
}
