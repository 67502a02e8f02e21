//! # Prompt Section
//!
//! Single-line input box. Enter submits as a broadcast; whitespace-only
//! input submits nothing. Input is capped at 280 chars.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::event::TuiEvent;
use crate::tui::msg::{Command, Msg};
use crate::tui::sections::Section;

pub const CHAR_LIMIT: usize = 280;
const PLACEHOLDER: &str = "Send a message...";

pub struct PromptSection {
    input: String,
    hidden: bool,
    focused: bool,
    width: u16,
    height: u16,
}

impl Default for PromptSection {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptSection {
    pub fn new() -> Self {
        PromptSection {
            input: String::new(),
            hidden: false,
            focused: false,
            width: 0,
            height: 0,
        }
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        &self.input
    }

    fn push_str_capped(&mut self, text: &str) {
        for c in text.chars() {
            if self.input.chars().count() >= CHAR_LIMIT {
                break;
            }
            // Newlines from paste flatten to spaces; the box is one line.
            self.input.push(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    fn handle_key(&mut self, event: &TuiEvent) -> (bool, Vec<Command>) {
        match event {
            TuiEvent::InputChar(c) => {
                if self.input.chars().count() < CHAR_LIMIT {
                    self.input.push(*c);
                }
                (true, Vec::new())
            }
            TuiEvent::Paste(data) => {
                self.push_str_capped(data);
                (true, Vec::new())
            }
            TuiEvent::Backspace => {
                self.input.pop();
                (true, Vec::new())
            }
            TuiEvent::Submit => {
                let text = self.input.trim().to_string();
                if text.is_empty() {
                    // Ignored, and the box is left as-is.
                    return (true, Vec::new());
                }
                self.input.clear();
                (true, vec![Command::Broadcast(Msg::PromptSubmitted(text))])
            }
            _ => (false, Vec::new()),
        }
    }
}

impl Section for PromptSection {
    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn hide(&mut self) {
        self.hidden = true;
    }

    fn show(&mut self) {
        self.hidden = false;
    }

    fn focus(&mut self) {
        self.hidden = false;
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn update(&mut self, msg: &mut Option<Msg>) -> Vec<Command> {
        if !self.focused {
            return Vec::new();
        }
        if let Some(Msg::Key(event)) = msg {
            let (handled, commands) = self.handle_key(&event.clone());
            if handled {
                msg.take();
            }
            return commands;
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border_color = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Prompt ")
            .title_bottom(
                Line::from(format!(" {}/{} ", self.input.chars().count(), CHAR_LIMIT))
                    .right_aligned(),
            );

        let content = if self.input.is_empty() {
            Line::from(Span::styled(
                PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(self.input.as_str())
        };

        let paragraph = Paragraph::new(content)
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, area);
    }

    fn set_dimensions(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(event: TuiEvent) -> Option<Msg> {
        Some(Msg::Key(event))
    }

    fn type_str(section: &mut PromptSection, text: &str) {
        for c in text.chars() {
            section.update(&mut key(TuiEvent::InputChar(c)));
        }
    }

    #[test]
    fn test_typing_requires_focus() {
        let mut section = PromptSection::new();
        let mut msg = key(TuiEvent::InputChar('a'));
        section.update(&mut msg);
        assert_eq!(section.input(), "");
        assert!(msg.is_some()); // left for the next section

        section.focus();
        let mut msg = key(TuiEvent::InputChar('a'));
        section.update(&mut msg);
        assert_eq!(section.input(), "a");
        assert!(msg.is_none());
    }

    #[test]
    fn test_submit_broadcasts_and_clears() {
        let mut section = PromptSection::new();
        section.focus();
        type_str(&mut section, "  hello  ");
        let commands = section.update(&mut key(TuiEvent::Submit));
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            &commands[0],
            Command::Broadcast(Msg::PromptSubmitted(text)) if text == "hello"
        ));
        assert_eq!(section.input(), "");
    }

    #[test]
    fn test_empty_submit_is_a_no_op() {
        let mut section = PromptSection::new();
        section.focus();
        type_str(&mut section, "   ");
        let commands = section.update(&mut key(TuiEvent::Submit));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_char_limit_is_enforced() {
        let mut section = PromptSection::new();
        section.focus();
        type_str(&mut section, &"x".repeat(CHAR_LIMIT + 20));
        assert_eq!(section.input().chars().count(), CHAR_LIMIT);

        section.update(&mut key(TuiEvent::Paste("more".to_string())));
        assert_eq!(section.input().chars().count(), CHAR_LIMIT);
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut section = PromptSection::new();
        section.focus();
        section.update(&mut key(TuiEvent::Paste("a\nb".to_string())));
        assert_eq!(section.input(), "a b");
    }

    #[test]
    fn test_scroll_keys_pass_through() {
        let mut section = PromptSection::new();
        section.focus();
        let mut msg = key(TuiEvent::CursorUp);
        section.update(&mut msg);
        assert!(msg.is_some());
    }
}
