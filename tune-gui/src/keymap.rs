//! Computer-keyboard shortcuts for the piano keys.
//!
//! The home row plays the white keys and the row above it the black keys,
//! the usual layout of software instruments.

use tune_core::NoteIndex;

/// Shortcut letter for each key, lowest first.
const SHORTCUTS: [&str; tune_core::KEY_COUNT] = [
    "a", "w", "s", "e", "d", "f", "t", "g", "y", "h", "u", "j",
];

/// The piano key bound to a typed character, ignoring case.
pub fn note_for_key(key: &str) -> Option<NoteIndex> {
    let key = key.to_lowercase();
    SHORTCUTS
        .iter()
        .position(|&shortcut| shortcut == key)
        .and_then(|index| NoteIndex::new(index).ok())
}

/// Shortcut letter shown on a piano key.
pub fn label_for_note(note: NoteIndex) -> &'static str {
    SHORTCUTS[note.value()]
}
