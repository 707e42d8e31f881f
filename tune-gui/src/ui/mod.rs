//! # UI Module
//!
//! This module contains the screens of the Tune application.

pub mod main_display;
pub mod setup_display;
