//! Focusable UI building blocks.
//!
//! A section decides for itself which messages it cares about. Messages
//! arrive as `&mut Option<Msg>`: a section that consumes a message `take`s
//! it (result messages have exactly one owner), while broadcasts are
//! observed by reference and left in place for the sections behind it.

pub mod convo;
pub mod help;
pub mod model_list;
pub mod prompt;

use ratatui::layout::Rect;
use ratatui::Frame;

use crate::tui::msg::{Command, Msg};

/// Identifies a section within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionName {
    Prompt,
    Convo,
    ModelList,
    Help,
}

pub trait Section {
    fn is_hidden(&self) -> bool;
    fn is_focused(&self) -> bool;

    fn hide(&mut self);
    fn show(&mut self);
    /// Focusing implies showing.
    fn focus(&mut self);
    fn blur(&mut self);

    /// React to a message. Consumed messages are taken out of the option.
    fn update(&mut self, msg: &mut Option<Msg>) -> Vec<Command>;

    fn render(&mut self, frame: &mut Frame, area: Rect);

    /// The section's allotted area, updated on resize and page open.
    fn set_dimensions(&mut self, width: u16, height: u16);
}
