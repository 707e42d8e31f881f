//! # Pitch Model
//!
//! Maps keys of a single-octave keyboard to audible frequencies using equal
//! temperament with A4 = 440 Hz, and perturbs them by a fraction of the gap
//! to a neighbouring semitone.
//!
//! ## Features
//! - 12-key keyboard from C4 (index 0) to B4 (index 11)
//! - Linear error injection toward the semitone above or below
//! - Octave transposition for multi-octave games
//! - Cent distance between two frequencies
//!
//! Everything here is pure and stateless; the tuning table is computed once.

use once_cell::sync::Lazy;

use crate::error::{GameError, GameResult};

/// Number of keys on the game keyboard.
pub const KEY_COUNT: usize = 12;

/// Distance in semitones from index 0 up to A4.
pub const REFERENCE_OFFSET: i32 = 9;

/// Frequency of A4 in Hz.
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Scientific octave number of the untransposed keyboard.
pub const BASE_OCTAVE: i8 = 4;

const NOTE_NAMES: [&str; KEY_COUNT] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A key on the game keyboard, always in `[0, KEY_COUNT)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteIndex(u8);

impl NoteIndex {
    /// Validates a raw key index.
    ///
    /// # Returns
    /// * `Ok(NoteIndex)` - The index is on the keyboard
    /// * `Err(GameError::InvalidInput)` - The index is out of range
    pub fn new(index: usize) -> GameResult<Self> {
        if index < KEY_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(GameError::InvalidInput {
                index,
                key_count: KEY_COUNT,
            })
        }
    }

    /// Maps any integer onto the keyboard by wrapping at the octave.
    pub(crate) fn wrapping(index: usize) -> Self {
        Self((index % KEY_COUNT) as u8)
    }

    /// All keys from lowest to highest.
    pub fn all() -> impl Iterator<Item = NoteIndex> {
        (0..KEY_COUNT as u8).map(NoteIndex)
    }

    pub fn value(self) -> usize {
        self.0 as usize
    }

    /// Note name without octave, e.g. "F#".
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.value()]
    }

    /// True for the sharps, which sit on the black keys.
    pub fn is_black(self) -> bool {
        self.name().ends_with('#')
    }
}

impl TryFrom<usize> for NoteIndex {
    type Error = GameError;

    fn try_from(index: usize) -> GameResult<Self> {
        NoteIndex::new(index)
    }
}

impl std::fmt::Display for NoteIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Equal-temperament frequency of a semitone position relative to index 0.
fn semitone_frequency(position: i32) -> f64 {
    REFERENCE_FREQUENCY * 2.0_f64.powf((position - REFERENCE_OFFSET) as f64 / 12.0)
}

/// Tuning data for the keyboard plus one semitone on each side.
///
/// Entry `i + 1` holds the frequency of key `i`, so entry 0 is the B below
/// the keyboard and entry 13 the C above it.
static TUNING: Lazy<[f64; KEY_COUNT + 2]> = Lazy::new(|| {
    let mut table = [0.0; KEY_COUNT + 2];
    for (slot, frequency) in table.iter_mut().enumerate() {
        *frequency = semitone_frequency(slot as i32 - 1);
    }
    table
});

/// Returns the in-tune frequency of a key in Hz.
pub fn frequency_of(index: NoteIndex) -> f64 {
    TUNING[index.value() + 1]
}

/// Returns the frequency of a key shifted by a fraction of a semitone gap.
///
/// A positive error moves toward the semitone above and a negative error
/// toward the semitone below, interpolating linearly in Hz. Edge keys use
/// the extra table entries outside the keyboard.
///
/// # Arguments
/// * `index` - The key being played
/// * `error` - Signed fraction of the gap to the neighbouring semitone
///
/// # Returns
/// * Frequency in Hz, equal to `frequency_of(index)` when `error` is zero
pub fn frequency_with_error(index: NoteIndex, error: f64) -> f64 {
    let correct = frequency_of(index);
    if error == 0.0 {
        return correct;
    }
    let slot = index.value() + 1;
    let neighbour = if error < 0.0 {
        TUNING[slot - 1]
    } else {
        TUNING[slot + 1]
    };
    correct + (neighbour - correct).abs() * error
}

/// Shifts a frequency by whole octaves.
pub fn transpose(frequency: f64, octaves: i32) -> f64 {
    frequency * 2.0_f64.powi(octaves)
}

/// Frequency of a key with error, played in the given scientific octave.
pub fn frequency_in_octave(index: NoteIndex, error: f64, octave: i8) -> f64 {
    transpose(
        frequency_with_error(index, error),
        i32::from(octave) - i32::from(BASE_OCTAVE),
    )
}

/// Calculates the distance from `target` to `frequency` in cents.
///
/// Positive values are sharp, negative values flat.
pub fn cents_between(frequency: f64, target: f64) -> f64 {
    1200.0 * (frequency / target).log2()
}
