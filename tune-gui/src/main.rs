//! # Tune - Ear Training GUI
//!
//! This module contains the desktop front-end for the Tune ear-training game.
//! The player picks the octaves to play in, then listens to the keys of a
//! one-octave piano: one of them is out of tune. Finding it makes the next
//! round harder; missing it ends the game.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Audio Thread**: Owned by the core's tone player, fed tone requests over a channel
//! - **Core**: All game rules live in `tune_core::Session`; this crate only maps
//!   clicks and key presses to session calls and renders the result

mod keymap;
mod ui;
mod widgets;

use anyhow::Result;
use iced::keyboard::{self, key::Named, Key, Modifiers};
use iced::{Element, Subscription, Task, Theme};
use tune_core::audio::CpalTonePlayer;
use tune_core::random::EntropySource;
use tune_core::storage::JsonFileStore;
use tune_core::{Feedback, GameConfig, NoteIndex, Outcome, Phase, Score, Session};
use ui::main_display::create_main_view;
use ui::setup_display::create_setup_view;

/// Environment variable naming an optional JSON game config.
const CONFIG_ENV: &str = "TUNE_CONFIG";

/// Store file used when the platform has no data directory.
const FALLBACK_STORE: &str = "tune_store.json";

type GameSession = Session<CpalTonePlayer, JsonFileStore, EntropySource>;

/// Main entry point for the Tune application.
pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("[MAIN] Starting Tune...");

    let app = match TuneApp::new() {
        Ok(app) => app,
        Err(e) => {
            log::error!("[MAIN] Could not set up the game: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = iced::application("Tune", TuneApp::update, TuneApp::view)
        .subscription(TuneApp::subscription)
        .theme(TuneApp::theme)
        .run_with(move || (app, Task::none()));
    log::info!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    // Setup screen
    ToggleOctave(i8), // Add or remove an octave from the selection
    Start,            // Leave setup and start the first game

    // Game screen
    KeySelected(usize), // User clicked or typed a piano key (0-11)
    Submit,             // Submit the selected key as the guess
    Continue,           // Next round after a correct guess
    TryAgain,           // New game after a game over
    Advance,            // Continue or try again, whichever applies
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Screen {
    Setup,
    Game,
}

/// Data the game screen needs for rendering.
#[derive(Debug, Clone)]
pub struct GameDisplayData {
    pub phase: Phase,
    pub selected: Option<NoteIndex>,
    pub feedback: Option<Feedback>,
    pub rounds_won: u32,
    pub high_score: Score,
}

struct TuneApp {
    screen: Screen,
    session: GameSession,
    /// Stored record, refreshed after each game over
    high_score: Score,
}

impl TuneApp {
    /// Builds the session from the optional config file, the score store,
    /// and the default audio output.
    fn new() -> Result<Self> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => match GameConfig::load(&path) {
                Ok(config) => {
                    log::info!("[MAIN] Loaded config from {}", path);
                    config
                }
                Err(e) => {
                    log::warn!("[MAIN] Ignoring config {}: {:#}", path, e);
                    GameConfig::default()
                }
            },
            Err(_) => GameConfig::default(),
        };

        let store = JsonFileStore::in_data_dir().unwrap_or_else(|e| {
            log::warn!("[MAIN] {:#}, storing scores in {}", e, FALLBACK_STORE);
            JsonFileStore::new(FALLBACK_STORE)
        });
        log::info!("[MAIN] Score store at {}", store.path().display());

        let session = Session::new(
            config,
            EntropySource::from_entropy(),
            CpalTonePlayer::start(),
            store,
        )?;
        Ok(Self {
            screen: Screen::Setup,
            high_score: session.high_score(),
            session,
        })
    }

    /// Handles application state updates based on incoming messages.
    ///
    /// Core errors are reported to the log and otherwise ignored: the
    /// controls only offer actions that are valid in the current phase,
    /// so an error here means a stray duplicate event.
    fn update(&mut self, message: Message) {
        log::debug!("[UPDATE] Received message: {:?}", message);

        let result = match message {
            Message::ToggleOctave(octave) => self.session.toggle_octave(octave),
            Message::Start => self.session.start().map(|()| {
                self.screen = Screen::Game;
            }),
            Message::KeySelected(_) | Message::Submit | Message::Continue | Message::TryAgain
            | Message::Advance
                if self.screen != Screen::Game =>
            {
                Ok(())
            }
            Message::KeySelected(index) => self.session.select_key(index),
            Message::Submit => self.session.submit().map(|feedback| {
                if feedback.outcome == Outcome::GameOver {
                    self.high_score = self.session.high_score();
                }
            }),
            Message::Continue => self.session.continue_round(),
            Message::TryAgain => self.session.try_again(),
            Message::Advance => match self.session.engine().phase() {
                Phase::Revealed(Outcome::Correct) => self.session.continue_round(),
                Phase::Revealed(Outcome::GameOver) => self.session.try_again(),
                _ => Ok(()),
            },
        };

        if let Err(e) = result {
            log::warn!("[UPDATE] {}", e);
        }
    }

    /// Renders the screen for the current stage of the application.
    fn view(&self) -> Element<'_, Message> {
        match self.screen {
            Screen::Setup => create_setup_view(self.session.octaves()),
            Screen::Game => create_main_view(&self.display_data()),
        }
    }

    fn display_data(&self) -> GameDisplayData {
        let engine = self.session.engine();
        GameDisplayData {
            phase: engine.phase(),
            selected: self.session.selected(),
            feedback: self.session.last_feedback().cloned(),
            rounds_won: engine.rounds_won(),
            high_score: self.high_score,
        }
    }

    /// Keyboard shortcuts for the piano keys and the game controls.
    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(handle_key_press)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn handle_key_press(key: Key, _modifiers: Modifiers) -> Option<Message> {
    match key.as_ref() {
        Key::Named(Named::Enter) => Some(Message::Submit),
        Key::Named(Named::Space) => Some(Message::Advance),
        Key::Character(c) => keymap::note_for_key(c).map(|note| Message::KeySelected(note.value())),
        _ => None,
    }
}
