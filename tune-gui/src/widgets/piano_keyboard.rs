//! # Piano Keyboard Widget
//!
//! This module provides the interactive one-octave piano keyboard the
//! player guesses on. It draws the twelve keys from C to B, reports clicks
//! as key selections, and colours keys to show the selection and, once the
//! answer is revealed, the correct and incorrect keys.

use iced::alignment::Horizontal;
use iced::widget::canvas::{self, event, Event, Fill, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Pixels, Point, Rectangle, Renderer, Size, Theme};
use tune_core::{NoteIndex, KEY_COUNT};

use crate::keymap;
use crate::Message;

/// Number of white keys in one octave.
const WHITE_KEY_COUNT: usize = 7;

/// Height of the keyboard canvas in pixels.
const KEYBOARD_HEIGHT: f32 = 160.0;

const SELECTED: Color = Color::from_rgb(0.20, 0.52, 0.86); // Blue
const CORRECT: Color = Color::from_rgb(0.20, 0.86, 0.60); // Green
const INCORRECT: Color = Color::from_rgb(1.0, 0.2, 0.2); // Red

/// Interactive keyboard for one game round.
#[derive(Debug, Clone)]
pub struct PianoKeyboard {
    /// Key the player has picked
    selected: Option<NoteIndex>,
    /// Revealed target key
    correct: Option<NoteIndex>,
    /// Revealed wrong guess
    incorrect: Option<NoteIndex>,
}

impl PianoKeyboard {
    pub fn new(
        selected: Option<NoteIndex>,
        correct: Option<NoteIndex>,
        incorrect: Option<NoteIndex>,
    ) -> Self {
        Self {
            selected,
            correct,
            incorrect,
        }
    }

    pub fn view(self) -> Element<'static, Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(KEYBOARD_HEIGHT)),
        )
        .into()
    }

    fn key_color(&self, note: NoteIndex) -> Color {
        if self.correct == Some(note) {
            CORRECT
        } else if self.incorrect == Some(note) {
            INCORRECT
        } else if self.selected == Some(note) && self.correct.is_none() {
            SELECTED
        } else if note.is_black() {
            Color::BLACK
        } else {
            Color::WHITE
        }
    }

    /// Rectangles of every key in drawing order: white keys, then black keys.
    fn key_rects(bounds: Size) -> Vec<(NoteIndex, Rectangle)> {
        let white_key_width = bounds.width / WHITE_KEY_COUNT as f32;
        let black_key_width = white_key_width * 0.6;
        let black_key_height = bounds.height * 0.6;

        let mut whites = Vec::with_capacity(WHITE_KEY_COUNT);
        let mut blacks = Vec::with_capacity(KEY_COUNT - WHITE_KEY_COUNT);
        let mut white_key_idx: f32 = 0.0;
        for note in NoteIndex::all() {
            if note.is_black() {
                // Centred on the line between the neighbouring white keys
                let key_x = white_key_idx * white_key_width - black_key_width / 2.0;
                blacks.push((
                    note,
                    Rectangle {
                        x: key_x,
                        y: 0.0,
                        width: black_key_width,
                        height: black_key_height,
                    },
                ));
            } else {
                whites.push((
                    note,
                    Rectangle {
                        x: white_key_idx * white_key_width,
                        y: 0.0,
                        width: white_key_width,
                        height: bounds.height,
                    },
                ));
                white_key_idx += 1.0;
            }
        }
        whites.extend(blacks);
        whites
    }

    fn key_index_from_pos(bounds: Size, pos: Point) -> Option<NoteIndex> {
        // Black keys are drawn last and sit on top
        Self::key_rects(bounds)
            .into_iter()
            .rev()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(note, _)| note)
    }
}

impl canvas::Program<Message> for PianoKeyboard {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        if let Some(position) = cursor.position_in(bounds) {
            if let Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
                if let Some(note) = Self::key_index_from_pos(bounds.size(), position) {
                    return (
                        event::Status::Captured,
                        Some(Message::KeySelected(note.value())),
                    );
                }
            }
        }
        (event::Status::Ignored, None)
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        for (note, rect) in Self::key_rects(bounds.size()) {
            let color = self.key_color(note);
            frame.fill_rectangle(rect.position(), rect.size(), Fill::from(color));
            frame.stroke(
                &Path::rectangle(rect.position(), rect.size()),
                Stroke::default().with_color(Color::BLACK),
            );

            let label_color = if note.is_black() && color == Color::BLACK {
                Color::WHITE
            } else {
                Color::BLACK
            };
            frame.fill_text(canvas::Text {
                content: keymap::label_for_note(note).to_uppercase(),
                position: Point::new(rect.center_x(), rect.y + rect.height - 22.0),
                color: label_color,
                size: Pixels(14.0),
                horizontal_alignment: Horizontal::Center,
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
