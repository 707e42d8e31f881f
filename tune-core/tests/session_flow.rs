use std::cell::RefCell;

use anyhow::{Result, anyhow};
use approx::assert_relative_eq;
use tune_core::audio::{SilentPlayer, TonePlayer};
use tune_core::pitch::{self, NoteIndex};
use tune_core::random::{RngSource, SequenceSource};
use tune_core::storage::{MemoryStore, ScoreStore};
use tune_core::{GameConfig, GameError, Outcome, Score, Session};

#[derive(Default)]
struct RecordingPlayer {
    tones: RefCell<Vec<f64>>,
}

impl TonePlayer for RecordingPlayer {
    fn play_tone(&self, frequency: f64) {
        self.tones.borrow_mut().push(frequency);
    }
}

/// Store whose every call fails, like an unavailable backend.
struct BrokenStore;

impl ScoreStore for BrokenStore {
    fn high_score(&self) -> Result<Option<Score>> {
        Err(anyhow!("storage offline"))
    }

    fn set_high_score(&self, _score: Score) -> Result<()> {
        Err(anyhow!("storage offline"))
    }

    fn octaves(&self) -> Result<Option<Vec<i8>>> {
        Err(anyhow!("storage offline"))
    }

    fn set_octaves(&self, _octaves: &[i8]) -> Result<()> {
        Err(anyhow!("storage offline"))
    }
}

type TestSession<S> = Session<RecordingPlayer, S, SequenceSource>;

/// Session whose rounds draw the given targets, always in octave 4, always sharp.
fn session<S: ScoreStore>(targets: &[usize], store: S) -> TestSession<S> {
    let indices = targets.iter().flat_map(|&t| [t, 0]).collect();
    let rng = SequenceSource::new(indices, vec![false]);
    Session::new(GameConfig::default(), rng, RecordingPlayer::default(), store).unwrap()
}

fn key(i: usize) -> NoteIndex {
    NoteIndex::new(i).unwrap()
}

#[test]
fn target_key_plays_mistuned_others_in_tune() {
    let mut session = session(&[4], MemoryStore::default());
    session.start().unwrap();

    session.select_key(3).unwrap();
    session.select_key(4).unwrap();

    let tones = session.player().tones.borrow().clone();
    assert_eq!(tones[0], pitch::frequency_of(key(3)));
    assert_eq!(tones[1], pitch::frequency_with_error(key(4), 0.25));
    assert!(tones[1] > pitch::frequency_of(key(4)));
    assert_eq!(session.selected(), Some(key(4)));
}

#[test]
fn winning_streak_then_game_over_stores_record() {
    let mut session = session(&[2, 7, 9], MemoryStore::default());
    session.start().unwrap();

    for target in [2, 7] {
        session.select_key(target).unwrap();
        let feedback = session.submit().unwrap();
        assert_eq!(feedback.outcome, Outcome::Correct);
        assert_eq!(feedback.score, None);
        session.continue_round().unwrap();
    }
    assert_relative_eq!(session.engine().error_magnitude(), 0.25 * 0.81, epsilon = 1e-12);

    session.select_key(1).unwrap();
    let feedback = session.submit().unwrap();
    assert_eq!(feedback.outcome, Outcome::GameOver);
    assert_eq!(feedback.target, key(9));
    assert_eq!(feedback.guess, key(1));
    assert_eq!(feedback.score, Some(Score::new(90.0)));
    assert_eq!(feedback.previous_best, Score::new(100.0));
    assert!(feedback.new_record);
    assert_eq!(session.store().writes(), vec![Score::new(90.0)]);
    assert_eq!(session.high_score(), Score::new(90.0));
}

#[test]
fn lower_score_replaces_record() {
    let store = MemoryStore::with_high_score(Score::new(100.0));
    let mut session = session(&[0, 5, 8], store);
    session.start().unwrap();
    for target in [0, 5] {
        session.select_key(target).unwrap();
        session.submit().unwrap();
        session.continue_round().unwrap();
    }
    session.select_key(6).unwrap();

    let feedback = session.submit().unwrap();
    assert_eq!(feedback.previous_best, Score::new(100.0));
    assert_eq!(feedback.score, Some(Score::new(90.0)));
    assert!(feedback.new_record);
}

#[test]
fn higher_score_leaves_record_alone() {
    let store = MemoryStore::with_high_score(Score::new(30.0));
    let mut session = session(&[0], store);
    session.start().unwrap();
    session.select_key(1).unwrap();

    let feedback = session.submit().unwrap();
    assert_eq!(feedback.score, Some(Score::new(100.0)));
    assert!(!feedback.new_record);
    assert!(session.store().writes().is_empty());
    assert_eq!(session.high_score(), Score::new(30.0));
}

#[test]
fn broken_store_does_not_stop_the_game() {
    let mut session = session(&[3, 8], BrokenStore);
    session.start().unwrap();
    session.select_key(2).unwrap();

    let feedback = session.submit().unwrap();
    assert_eq!(feedback.outcome, Outcome::GameOver);
    assert_eq!(feedback.previous_best, session.high_score());
    assert_eq!(feedback.previous_best, Score::new(100.0));
    assert!(!feedback.new_record);
    assert_eq!(session.high_score(), Score::new(100.0));

    session.try_again().unwrap();
    assert_eq!(session.engine().error(), 0.25);
    assert!(!session.engine().answer_revealed());
}

#[test]
fn submit_needs_a_selection_and_repeats_are_harmless() {
    let mut session = session(&[5], MemoryStore::default());
    session.start().unwrap();
    assert!(matches!(session.submit(), Err(GameError::InvalidState(_))));

    session.select_key(5).unwrap();
    let first = session.submit().unwrap();
    let error = session.engine().error();
    let again = session.submit().unwrap();
    assert_eq!(first, again);
    assert_eq!(session.engine().error(), error);
}

#[test]
fn keys_are_locked_after_reveal() {
    let mut session = session(&[5], MemoryStore::default());
    session.start().unwrap();
    session.select_key(5).unwrap();
    session.submit().unwrap();

    session.select_key(9).unwrap();
    assert_eq!(session.selected(), Some(key(5)));
    assert_eq!(session.player().tones.borrow().len(), 1);
}

#[test]
fn actions_before_start_fail() {
    let mut session = session(&[5], MemoryStore::default());
    assert!(matches!(session.select_key(1), Err(GameError::InvalidState(_))));
    assert!(matches!(session.continue_round(), Err(GameError::InvalidState(_))));
    assert!(matches!(
        session.select_key(12),
        Err(GameError::InvalidInput { index: 12, .. })
    ));
}

#[test]
fn octave_selection_is_restored_and_persisted() {
    let store = MemoryStore::default();
    store.set_octaves(&[3]).unwrap();
    let mut session = session(&[9], store);
    assert_eq!(session.octaves(), &[3]);

    session.toggle_octave(5).unwrap();
    session.toggle_octave(3).unwrap();
    assert_eq!(session.octaves(), &[5]);
    session.start().unwrap();
    assert_eq!(session.store().octaves().unwrap(), Some(vec![5]));

    session.select_key(9).unwrap();
    let expected = 880.0 * (1.0 + 0.25 * (2f64.powf(1.0 / 12.0) - 1.0));
    assert_relative_eq!(session.player().tones.borrow()[0], expected, epsilon = 1e-9);
}

#[test]
fn starting_without_octaves_is_rejected() {
    let mut session = session(&[0], MemoryStore::default());
    session.toggle_octave(4).unwrap();
    assert!(session.octaves().is_empty());
    assert!(matches!(session.start(), Err(GameError::InvalidConfig(_))));
    assert!(session.toggle_octave(12).is_err());
}

#[test]
fn seeded_games_are_reproducible() {
    let play = |seed| {
        let mut session = Session::new(
            GameConfig::default(),
            RngSource::seeded(seed),
            RecordingPlayer::default(),
            MemoryStore::default(),
        )
        .unwrap();
        session.start().unwrap();
        (0..12).for_each(|k| session.select_key(k).unwrap());
        session.player().tones.borrow().clone()
    };
    assert_eq!(play(11), play(11));
}

#[test]
fn headless_session_plays_a_full_game() {
    let mut session = Session::new(
        GameConfig::default(),
        RngSource::seeded(3),
        SilentPlayer,
        MemoryStore::default(),
    )
    .unwrap();
    session.start().unwrap();
    let mut rounds = 0;
    loop {
        // Always guess C: the game ends the first time C is not the target
        session.select_key(0).unwrap();
        if session.submit().unwrap().outcome == Outcome::GameOver {
            break;
        }
        rounds += 1;
        session.continue_round().unwrap();
    }
    assert_eq!(session.engine().rounds_won(), rounds);
    assert_eq!(session.store().writes().len(), 1);
}
