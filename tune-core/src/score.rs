//! # Scoring
//!
//! A score is the error of the last round the player won, as a percentage of
//! the starting error. Lower is better; 100 means no round was won.

use serde::{Deserialize, Serialize};

/// Worst possible score, also the default when no record exists.
pub const MAX_SCORE: f64 = 100.0;

/// Significant digits kept when a score is reported or stored.
pub const SIGNIFICANT_DIGITS: i32 = 4;

/// Scores at or below this are worth showing to the player.
pub const PRECISION_DISPLAY_LIMIT: f64 = 25.0;

/// Full-precision score. Rounding happens only through [`Score::rounded`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Derives a score from the error magnitude at game over.
    ///
    /// The engine does not ramp on a failed round, so dividing by the ramp
    /// factor recovers the error of the last round that was won.
    pub fn from_error(magnitude: f64, ramp_factor: f64, base_error: f64) -> Self {
        let raw = magnitude.abs() / ramp_factor / base_error * 100.0;
        Self(raw.min(MAX_SCORE))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The score rounded to four significant digits.
    pub fn rounded(self) -> Score {
        Score(round_significant(self.0, SIGNIFICANT_DIGITS))
    }

    /// Whether the score is good enough to be shown as a precision.
    pub fn is_notable(self) -> bool {
        self.rounded().0 <= PRECISION_DISPLAY_LIMIT
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.rounded().0)
    }
}

/// Rounds `value` to `digits` significant digits.
pub fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

/// Whether `candidate` beats the stored record.
///
/// A missing record is always beaten; otherwise the candidate must be
/// strictly lower.
pub fn should_replace(record: Option<Score>, candidate: Score) -> bool {
    match record {
        Some(record) => candidate < record,
        None => true,
    }
}
