//! # Main Display Module
//!
//! This module contains the game screen: result and details text, the
//! piano keyboard, and the buttons that move the game along.

use iced::widget::{button, column, container, horizontal_space, row, text, Space};
use iced::{Alignment, Color, Element, Length};
use tune_core::{Feedback, Outcome, Phase};

use crate::widgets::piano_keyboard::PianoKeyboard;
use crate::{GameDisplayData, Message};

const DIM_TEXT: Color = Color::from_rgb(0.7, 0.7, 0.7);

/// Headline shown after a guess.
pub fn result_text(feedback: Option<&Feedback>) -> &'static str {
    match feedback.map(|f| f.outcome) {
        Some(Outcome::Correct) => "Correct!",
        Some(Outcome::GameOver) => "Game Over",
        None => "",
    }
}

/// Detail lines shown under the headline.
///
/// After a game over the precision is only shown when it is worth
/// bragging about; the previous best is always shown.
pub fn details_lines(feedback: Option<&Feedback>) -> Vec<String> {
    let Some(feedback) = feedback else {
        return vec!["Find the key that sounds out of tune".to_string()];
    };
    match feedback.outcome {
        Outcome::Correct => vec!["Next one will be 10% harder".to_string()],
        Outcome::GameOver => {
            let mut lines = Vec::new();
            if let Some(score) = feedback.score.filter(|s| s.is_notable()) {
                lines.push(format!("Your precision: {}", score));
            }
            lines.push(format!("Previous best: {}", feedback.previous_best));
            if feedback.new_record && feedback.score.is_some_and(|s| s < feedback.previous_best) {
                lines.push("New record!".to_string());
            }
            lines
        }
    }
}

/// Creates the complete game view.
pub fn create_main_view(data: &GameDisplayData) -> Element<'static, Message> {
    log::trace!("[VIEW] Rendering game screen...");

    let header = row![
        text("Tune").size(28),
        horizontal_space(),
        text(format!("Streak: {}", data.rounds_won)).size(16),
        Space::with_width(20),
        text(format!("Best: {}", data.high_score)).size(16),
    ]
    .align_y(Alignment::Center);

    let feedback = data.feedback.as_ref();
    let details = details_lines(feedback)
        .into_iter()
        .fold(column![].spacing(4), |col, line| {
            col.push(text(line).size(16).color(DIM_TEXT))
        });

    let (correct, incorrect) = match feedback {
        Some(f) if f.outcome == Outcome::GameOver => (Some(f.target), Some(f.guess)),
        Some(f) => (Some(f.target), None),
        None => (None, None),
    };
    let keyboard = PianoKeyboard::new(data.selected, correct, incorrect).view();

    let main_content = column![
        header,
        Space::with_height(20),
        text(result_text(feedback)).size(24),
        details,
        Space::with_height(10),
        keyboard,
        Space::with_height(10),
        create_controls(data),
    ]
    .spacing(10)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// The one button that applies to the current phase.
fn create_controls(data: &GameDisplayData) -> Element<'static, Message> {
    let control = match data.phase {
        Phase::AwaitingGuess | Phase::Idle => button(text("Submit").size(18))
            .on_press_maybe(data.selected.map(|_| Message::Submit)),
        Phase::Revealed(Outcome::Correct) => {
            button(text("Continue").size(18)).on_press(Message::Continue)
        }
        Phase::Revealed(Outcome::GameOver) => {
            button(text("Try again").size(18)).on_press(Message::TryAgain)
        }
    };

    row![
        control.padding([10, 24]).style(button::primary),
        horizontal_space(),
        text("Keys: A W S E D F T G Y H U J   Enter: submit   Space: next")
            .size(14)
            .color(DIM_TEXT),
    ]
    .align_y(Alignment::Center)
    .into()
}
