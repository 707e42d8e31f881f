//! # Round Engine
//!
//! Owns the answer of the current round, judges guesses, and drives the
//! adaptive error: every correct guess multiplies the error by the ramp
//! factor, a wrong guess ends the game and freezes the error as the score.
//!
//! ```text
//!  Idle --start_game--> AwaitingGuess --submit_guess--> Revealed(Correct)  --next_round--> AwaitingGuess
//!                                                    \-> Revealed(GameOver) --reset_game--> AwaitingGuess
//! ```

use crate::config::{ErrorMode, GameConfig};
use crate::error::{GameError, GameResult};
use crate::pitch::{KEY_COUNT, NoteIndex};
use crate::random::RandomSource;
use crate::score::Score;

/// Result of a submitted guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game started yet.
    Idle,
    AwaitingGuess,
    Revealed(Outcome),
}

/// The note the player has to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub target: NoteIndex,
    /// Scientific octave the round is played in.
    pub octave: i8,
    pub revealed: bool,
}

/// Distance in semitones between two keys.
///
/// The two ends of the keyboard are an octave-wrap apart, so 11 counts as 1.
pub fn answer_distance(a: NoteIndex, b: NoteIndex) -> usize {
    let distance = a.value().abs_diff(b.value());
    if distance == KEY_COUNT - 1 { 1 } else { distance }
}

#[derive(Debug)]
pub struct RoundEngine<R> {
    config: GameConfig,
    rng: R,
    phase: Phase,
    answer: Option<Answer>,
    /// Signed error fraction of the current round.
    error: f64,
    rounds_won: u32,
}

impl<R: RandomSource> RoundEngine<R> {
    /// Creates an idle engine. Call [`RoundEngine::start_game`] to play.
    pub fn new(config: GameConfig, rng: R) -> GameResult<Self> {
        config.validate()?;
        Ok(Self {
            error: config.base_error,
            config,
            rng,
            phase: Phase::Idle,
            answer: None,
            rounds_won: 0,
        })
    }

    /// Replaces the octave set used by the next drawn round.
    pub fn set_octaves(&mut self, octaves: Vec<i8>) -> GameResult<()> {
        let config = GameConfig {
            octaves,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    /// Signed error of the current round.
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn error_magnitude(&self) -> f64 {
        self.error.abs()
    }

    /// Consecutive correct guesses in the current game.
    pub fn rounds_won(&self) -> u32 {
        self.rounds_won
    }

    /// Begins a new game from the base error, whatever the current phase.
    pub fn start_game(&mut self) {
        self.restart();
        log::info!("[ROUND] New game, error {:.4}", self.error);
    }

    /// Judges a guess for the current round.
    ///
    /// A second guess after the answer is revealed changes nothing and
    /// returns the outcome already decided. The index is checked first, so
    /// an out-of-range guess is `InvalidInput` in every phase.
    ///
    /// # Returns
    /// * `Ok(Outcome::Correct)` - Error ramped down for the next round
    /// * `Ok(Outcome::GameOver)` - Error left as the final score
    /// * `Err(GameError::InvalidInput)` - `index` is not a key
    /// * `Err(GameError::InvalidState)` - No game has been started
    pub fn submit_guess(&mut self, index: usize) -> GameResult<Outcome> {
        let guess = NoteIndex::new(index)?;
        let answer = match (self.phase, self.answer.as_mut()) {
            (Phase::Revealed(outcome), _) => {
                log::debug!("[ROUND] Ignoring guess {} after reveal", guess);
                return Ok(outcome);
            }
            (Phase::AwaitingGuess, Some(answer)) => answer,
            _ => return Err(GameError::InvalidState("no round in progress".into())),
        };

        answer.revealed = true;
        let outcome = if answer_distance(guess, answer.target) == 0 {
            self.error *= self.config.ramp_factor;
            self.rounds_won += 1;
            Outcome::Correct
        } else {
            Outcome::GameOver
        };
        log::info!(
            "[ROUND] Guess {} for {}: {:?}, error now {:.5}",
            guess,
            answer.target,
            outcome,
            self.error
        );
        self.phase = Phase::Revealed(outcome);
        Ok(outcome)
    }

    /// Draws the next round after a correct guess, keeping the error.
    pub fn next_round(&mut self) -> GameResult<()> {
        match self.phase {
            Phase::Revealed(Outcome::Correct) => {
                self.draw_round();
                Ok(())
            }
            Phase::Revealed(Outcome::GameOver) => Err(GameError::InvalidState(
                "game over: reset the game instead".into(),
            )),
            _ => Err(GameError::InvalidState(
                "next round requires a correct guess".into(),
            )),
        }
    }

    /// Starts over from the base error after a game over.
    pub fn reset_game(&mut self) -> GameResult<()> {
        match self.phase {
            Phase::Revealed(Outcome::GameOver) => {
                self.restart();
                log::info!("[ROUND] Game reset, error {:.4}", self.error);
                Ok(())
            }
            _ => Err(GameError::InvalidState(
                "reset requires a finished game".into(),
            )),
        }
    }

    /// Score of the game that just ended.
    ///
    /// # Returns
    /// * `Ok(Score)` - Full-precision score once a guess ended the game
    /// * `Err(GameError::InvalidState)` - The game is still running
    pub fn compute_score(&self) -> GameResult<Score> {
        match self.phase {
            Phase::Revealed(Outcome::GameOver) => Ok(Score::from_error(
                self.error,
                self.config.ramp_factor,
                self.config.base_error,
            )),
            _ => Err(GameError::InvalidState(
                "score is only defined after a game over".into(),
            )),
        }
    }

    pub fn answer_revealed(&self) -> bool {
        self.answer.is_some_and(|a| a.revealed)
    }

    /// The target key, only available once the answer is revealed.
    pub fn target_index(&self) -> GameResult<NoteIndex> {
        match self.answer {
            Some(answer) if answer.revealed => Ok(answer.target),
            _ => Err(GameError::InvalidState("answer not revealed yet".into())),
        }
    }

    /// Error to play a key with: the target sounds off, the rest in tune.
    pub fn played_error_for(&self, index: NoteIndex) -> f64 {
        match self.answer {
            Some(answer) if answer.target == index => self.error,
            _ => 0.0,
        }
    }

    fn restart(&mut self) {
        self.error = self.config.base_error;
        self.rounds_won = 0;
        self.draw_round();
    }

    fn draw_round(&mut self) {
        let target = NoteIndex::wrapping(self.rng.next_index(KEY_COUNT));
        let octaves = &self.config.octaves;
        let octave = octaves[self.rng.next_index(octaves.len()) % octaves.len()];
        if self.config.error_mode == ErrorMode::Signed {
            let magnitude = self.error.abs();
            self.error = if self.rng.coin_flip() { -magnitude } else { magnitude };
        }
        self.answer = Some(Answer {
            target,
            octave,
            revealed: false,
        });
        self.phase = Phase::AwaitingGuess;
        log::debug!("[ROUND] Target {}{} drawn", target, octave);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceSource;
    use approx::assert_relative_eq;

    fn engine(indices: Vec<usize>, coins: Vec<bool>) -> RoundEngine<SequenceSource> {
        RoundEngine::new(GameConfig::default(), SequenceSource::new(indices, coins)).unwrap()
    }

    fn key(i: usize) -> NoteIndex {
        NoteIndex::new(i).unwrap()
    }

    #[test]
    fn distance_wraps_at_the_octave() {
        assert_eq!(answer_distance(key(0), key(11)), 1);
        assert_eq!(answer_distance(key(11), key(0)), 1);
        assert_eq!(answer_distance(key(0), key(10)), 10);
        assert_eq!(answer_distance(key(3), key(5)), 2);
        assert_eq!(answer_distance(key(7), key(7)), 0);
    }

    #[test]
    fn correct_guess_ramps_error() {
        // index draws alternate target, octave
        let mut engine = engine(vec![5, 0], vec![false]);
        engine.start_game();
        assert_eq!(engine.phase(), Phase::AwaitingGuess);

        assert_eq!(engine.submit_guess(5), Ok(Outcome::Correct));
        assert_relative_eq!(engine.error_magnitude(), 0.225);
        assert!(engine.answer_revealed());
        assert_eq!(engine.target_index(), Ok(key(5)));
    }

    #[test]
    fn n_correct_guesses_follow_the_ramp() {
        let mut engine = engine(vec![2, 0], vec![true, false]);
        engine.start_game();
        for n in 1..=20 {
            assert_eq!(engine.submit_guess(2), Ok(Outcome::Correct));
            assert_relative_eq!(engine.error_magnitude(), 0.25 * 0.9f64.powi(n), epsilon = 1e-12);
            engine.next_round().unwrap();
        }
        assert_eq!(engine.rounds_won(), 20);
    }

    #[test]
    fn wrong_guess_ends_the_game_without_ramping() {
        let mut engine = engine(vec![4, 0], vec![false]);
        engine.start_game();
        let before = engine.error();

        assert_eq!(engine.submit_guess(9), Ok(Outcome::GameOver));
        assert_eq!(engine.error(), before);
        let score = engine.compute_score().unwrap();
        assert!(score.value() > 0.0 && score.value() <= 100.0);
        assert!(matches!(engine.next_round(), Err(GameError::InvalidState(_))));
    }

    #[test]
    fn neighbouring_edge_keys_are_still_wrong() {
        let mut engine = engine(vec![0, 0], vec![false]);
        engine.start_game();
        assert_eq!(engine.submit_guess(11), Ok(Outcome::GameOver));
    }

    #[test]
    fn score_after_one_won_round_is_one_hundred() {
        let mut engine = engine(vec![1, 0, 6, 0], vec![false]);
        engine.start_game();
        engine.submit_guess(1).unwrap();
        engine.next_round().unwrap();
        engine.submit_guess(0).unwrap();
        assert_relative_eq!(engine.error_magnitude(), 0.225);
        assert_eq!(engine.compute_score().unwrap().rounded().value(), 100.0);
    }

    #[test]
    fn duplicate_guesses_are_ignored() {
        let mut engine = engine(vec![3, 0], vec![false]);
        engine.start_game();
        engine.submit_guess(3).unwrap();
        let error = engine.error();

        assert_eq!(engine.submit_guess(3), Ok(Outcome::Correct));
        assert_eq!(engine.submit_guess(8), Ok(Outcome::Correct));
        assert_eq!(engine.error(), error);
        assert_eq!(engine.rounds_won(), 1);
    }

    #[test]
    fn out_of_range_guess_is_invalid_input() {
        let mut engine = engine(vec![3, 0], vec![false]);
        engine.start_game();
        assert_eq!(
            engine.submit_guess(12),
            Err(GameError::InvalidInput {
                index: 12,
                key_count: 12
            })
        );
        assert_eq!(engine.phase(), Phase::AwaitingGuess);
    }

    #[test]
    fn out_of_range_guess_after_reveal_is_still_invalid() {
        let mut engine = engine(vec![3, 0], vec![false]);
        engine.start_game();
        engine.submit_guess(3).unwrap();
        assert!(matches!(
            engine.submit_guess(40),
            Err(GameError::InvalidInput { index: 40, .. })
        ));
        assert_eq!(engine.phase(), Phase::Revealed(Outcome::Correct));
        assert_eq!(engine.rounds_won(), 1);
    }

    #[test]
    fn idle_engine_rejects_actions_and_queries() {
        let mut engine = engine(vec![], vec![]);
        assert!(matches!(engine.submit_guess(0), Err(GameError::InvalidState(_))));
        assert!(matches!(engine.next_round(), Err(GameError::InvalidState(_))));
        assert!(matches!(engine.reset_game(), Err(GameError::InvalidState(_))));
        assert!(matches!(engine.compute_score(), Err(GameError::InvalidState(_))));
        assert!(matches!(engine.target_index(), Err(GameError::InvalidState(_))));
        assert!(!engine.answer_revealed());
    }

    #[test]
    fn score_is_undefined_while_playing() {
        let mut engine = engine(vec![3, 0], vec![false]);
        engine.start_game();
        assert!(engine.compute_score().is_err());
        engine.submit_guess(3).unwrap();
        assert!(engine.compute_score().is_err());
    }

    #[test]
    fn target_hidden_until_reveal() {
        let mut engine = engine(vec![3, 0], vec![false]);
        engine.start_game();
        assert!(engine.target_index().is_err());
    }

    #[test]
    fn reset_restores_base_error_and_redraws_sign() {
        let mut engine = engine(vec![3, 0, 7, 0, 10, 0], vec![false, false, true]);
        engine.start_game();
        engine.submit_guess(3).unwrap();
        engine.next_round().unwrap();
        assert!(matches!(engine.reset_game(), Err(GameError::InvalidState(_))));
        engine.submit_guess(0).unwrap();

        engine.reset_game().unwrap();
        assert_eq!(engine.error(), -0.25);
        assert_eq!(engine.rounds_won(), 0);
        assert_eq!(engine.answer().map(|a| a.target), Some(key(10)));
        assert!(!engine.answer_revealed());
    }

    #[test]
    fn unsigned_mode_never_goes_flat() {
        let config = GameConfig {
            error_mode: ErrorMode::Unsigned,
            ..GameConfig::default()
        };
        let mut engine =
            RoundEngine::new(config, SequenceSource::new(vec![0], vec![true])).unwrap();
        engine.start_game();
        assert_eq!(engine.error(), 0.25);
    }

    #[test]
    fn only_the_target_plays_out_of_tune() {
        let mut engine = engine(vec![6, 0], vec![true]);
        engine.start_game();
        assert_eq!(engine.played_error_for(key(6)), -0.25);
        assert_eq!(engine.played_error_for(key(5)), 0.0);
    }

    #[test]
    fn octave_drawn_from_configured_set() {
        let config = GameConfig {
            octaves: vec![2, 5],
            ..GameConfig::default()
        };
        let mut engine =
            RoundEngine::new(config, SequenceSource::new(vec![4, 1], vec![false])).unwrap();
        engine.start_game();
        assert_eq!(engine.answer().map(|a| a.octave), Some(5));
        assert!(engine.set_octaves(vec![]).is_err());
    }
}
