//! # Setup Display Module
//!
//! Octave selection shown before the first game.

use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Element, Length};
use tune_core::config::OCTAVE_RANGE;

use crate::Message;

/// Octaves offered on the setup screen, the full range a config may name.
pub fn selectable_octaves() -> impl Iterator<Item = i8> {
    OCTAVE_RANGE
}

/// Creates the octave selection view.
pub fn create_setup_view(selected: &[i8]) -> Element<'static, Message> {
    let octave_buttons = selectable_octaves().fold(row![].spacing(8), |row, octave| {
        let style = if selected.contains(&octave) {
            button::primary
        } else {
            button::secondary
        };
        row.push(
            button(text(format!("Octave {octave}")).size(16))
                .padding([8, 14])
                .style(style)
                .on_press(Message::ToggleOctave(octave)),
        )
    });

    let start = button(text("Start").size(20))
        .padding([10, 30])
        .style(button::success)
        .on_press_maybe((!selected.is_empty()).then_some(Message::Start));

    let content = column![
        text("Tune").size(40),
        text("Find the key that sounds out of tune.").size(16),
        Space::with_height(30),
        text("Octaves to play in").size(18),
        octave_buttons,
        Space::with_height(30),
        start,
    ]
    .spacing(10)
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
