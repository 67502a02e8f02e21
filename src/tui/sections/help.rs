//! # Help Section
//!
//! Static key-binding reference. Esc closes the page (handled by the
//! loop's page navigation).

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph};
use ratatui::Frame;

use crate::tui::msg::{Command, Msg};
use crate::tui::sections::Section;

const BINDINGS: &[(&str, &str)] = &[
    ("Enter", "Send the prompt"),
    ("Tab", "Move focus to the next section"),
    ("Up/Down", "Scroll the conversation"),
    ("PgUp/PgDn", "Scroll by a page"),
    ("End", "Jump to the latest message"),
    ("Ctrl+P", "Choose a model"),
    ("Ctrl+G", "This help"),
    ("Esc", "Close page / cancel generation"),
    ("Ctrl+C", "Quit"),
];

pub struct HelpSection {
    hidden: bool,
    focused: bool,
    width: u16,
    height: u16,
}

impl Default for HelpSection {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpSection {
    pub fn new() -> Self {
        HelpSection {
            hidden: false,
            focused: false,
            width: 0,
            height: 0,
        }
    }
}

impl Section for HelpSection {
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

    fn update(&mut self, _msg: &mut Option<Msg>) -> Vec<Command> {
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Help ")
            .title_bottom(Line::from(" Esc Back ").centered())
            .padding(Padding::uniform(1));

        let key_width = BINDINGS.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let lines: Vec<Line> = BINDINGS
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(
                        format!("{key:<key_width$}"),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::raw(*action),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn set_dimensions(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}
