//! Custom canvas widgets.

pub mod piano_keyboard;
