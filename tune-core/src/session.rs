//! # Session Controller
//!
//! Thin glue between the presentation layer and the core: turns player
//! actions into round engine calls, plays keys through the tone player, and
//! keeps the high score in the store.

use crate::audio::TonePlayer;
use crate::config::{GameConfig, OCTAVE_RANGE};
use crate::error::{GameError, GameResult};
use crate::pitch::{self, NoteIndex};
use crate::random::RandomSource;
use crate::round::{Outcome, Phase, RoundEngine};
use crate::score::{self, MAX_SCORE, Score};
use crate::storage::ScoreStore;

/// What the player is told after submitting a guess.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub outcome: Outcome,
    pub target: NoteIndex,
    pub guess: NoteIndex,
    /// Rounded score, present after a game over.
    pub score: Option<Score>,
    /// Record before this game, the default high score when none was
    /// stored. Only meaningful after a game over.
    pub previous_best: Score,
    pub new_record: bool,
}

pub struct Session<P, S, R> {
    engine: RoundEngine<R>,
    player: P,
    store: S,
    octaves: Vec<i8>,
    selected: Option<NoteIndex>,
    last_feedback: Option<Feedback>,
}

impl<P: TonePlayer, S: ScoreStore, R: RandomSource> Session<P, S, R> {
    /// Creates a session, restoring the stored octave selection if any.
    pub fn new(mut config: GameConfig, rng: R, player: P, store: S) -> GameResult<Self> {
        match store.octaves() {
            Ok(Some(octaves)) if !octaves.is_empty() => config.octaves = octaves,
            Ok(_) => {}
            Err(e) => log::warn!("[SESSION] Could not read stored octaves: {:#}", e),
        }
        if config.validate().is_err() {
            log::warn!("[SESSION] Stored octaves rejected, using defaults");
            config.octaves = GameConfig::default().octaves;
        }
        Ok(Self {
            octaves: config.octaves.clone(),
            engine: RoundEngine::new(config, rng)?,
            player,
            store,
            selected: None,
            last_feedback: None,
        })
    }

    pub fn engine(&self) -> &RoundEngine<R> {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn selected(&self) -> Option<NoteIndex> {
        self.selected
    }

    pub fn last_feedback(&self) -> Option<&Feedback> {
        self.last_feedback.as_ref()
    }

    /// Octaves selected for the next game.
    pub fn octaves(&self) -> &[i8] {
        &self.octaves
    }

    /// Adds the octave if missing, removes it otherwise.
    ///
    /// The selection may become empty while the player is choosing;
    /// [`Session::start`] refuses to run without an octave.
    pub fn toggle_octave(&mut self, octave: i8) -> GameResult<()> {
        if !OCTAVE_RANGE.contains(&octave) {
            return Err(GameError::InvalidConfig(format!("octave {octave} out of range")));
        }
        if let Some(position) = self.octaves.iter().position(|&o| o == octave) {
            self.octaves.remove(position);
        } else {
            self.octaves.push(octave);
            self.octaves.sort_unstable();
        }
        Ok(())
    }

    /// Persists the octave selection and starts a new game.
    pub fn start(&mut self) -> GameResult<()> {
        self.engine.set_octaves(self.octaves.clone())?;
        if let Err(e) = self.store.set_octaves(&self.octaves) {
            log::warn!("[SESSION] Could not store octaves: {:#}", e);
        }
        self.selected = None;
        self.last_feedback = None;
        self.engine.start_game();
        Ok(())
    }

    /// Selects a key and plays it.
    ///
    /// The target key sounds with the current error and every other key in
    /// tune. Ignored once the answer is revealed.
    pub fn select_key(&mut self, index: usize) -> GameResult<()> {
        let key = NoteIndex::new(index)?;
        let answer = match self.engine.phase() {
            Phase::AwaitingGuess => self.engine.answer().copied(),
            Phase::Revealed(_) => return Ok(()),
            Phase::Idle => return Err(GameError::InvalidState("game not started".into())),
        };
        let Some(answer) = answer else {
            return Err(GameError::InvalidState("no round in progress".into()));
        };
        self.selected = Some(key);
        let error = self.engine.played_error_for(key);
        let frequency = pitch::frequency_in_octave(key, error, answer.octave);
        log::debug!(
            "[SESSION] Playing {}{} at {:.2} Hz ({:+.1} cents)",
            key,
            answer.octave,
            frequency,
            pitch::cents_between(frequency, pitch::frequency_in_octave(key, 0.0, answer.octave))
        );
        self.player.play_tone(frequency);
        Ok(())
    }

    /// Submits the selected key as the guess.
    ///
    /// On game over the score is compared with the stored record and
    /// written back when it is strictly lower. Store failures are logged
    /// and treated as "no record".
    pub fn submit(&mut self) -> GameResult<Feedback> {
        if let (Phase::Revealed(_), Some(feedback)) = (self.engine.phase(), &self.last_feedback) {
            return Ok(feedback.clone());
        }
        let guess = self
            .selected
            .ok_or_else(|| GameError::InvalidState("no key selected".into()))?;
        let outcome = self.engine.submit_guess(guess.value())?;
        let target = self.engine.target_index()?;

        let mut feedback = Feedback {
            outcome,
            target,
            guess,
            score: None,
            previous_best: Score::new(MAX_SCORE),
            new_record: false,
        };
        if outcome == Outcome::GameOver {
            let score = self.engine.compute_score()?.rounded();
            let record = match self.store.high_score() {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("[SESSION] Could not read high score: {:#}", e);
                    None
                }
            };
            if score::should_replace(record, score) {
                match self.store.set_high_score(score) {
                    Ok(()) => feedback.new_record = true,
                    Err(e) => log::warn!("[SESSION] Could not store high score: {:#}", e),
                }
            }
            log::info!(
                "[SESSION] Game over after {} rounds, score {}",
                self.engine.rounds_won(),
                score
            );
            feedback.score = Some(score);
            feedback.previous_best = record.unwrap_or(Score::new(MAX_SCORE));
        }
        self.last_feedback = Some(feedback.clone());
        Ok(feedback)
    }

    /// Moves on after a correct guess.
    pub fn continue_round(&mut self) -> GameResult<()> {
        self.engine.next_round()?;
        self.selected = None;
        self.last_feedback = None;
        Ok(())
    }

    /// Starts over after a game over, keeping the octave selection.
    pub fn try_again(&mut self) -> GameResult<()> {
        self.engine.reset_game()?;
        self.selected = None;
        self.last_feedback = None;
        Ok(())
    }

    /// Best stored score, or the default when nothing is stored.
    pub fn high_score(&self) -> Score {
        match self.store.high_score() {
            Ok(Some(score)) => score,
            Ok(None) => Score::new(MAX_SCORE),
            Err(e) => {
                log::warn!("[SESSION] Could not read high score: {:#}", e);
                Score::new(MAX_SCORE)
            }
        }
    }
}
