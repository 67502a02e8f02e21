//! # Model List Section
//!
//! Pickable models across every platform, with the owning platform
//! tagged. Enter broadcasts the selection and closes the page; the actual
//! switch happens in the conversation section, which ignores it mid-turn.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding};
use ratatui::Frame;

use crate::llm::types::{ModelEntry, Platform};
use crate::tui::event::TuiEvent;
use crate::tui::msg::{Command, Msg};
use crate::tui::sections::Section;

pub struct ModelListSection {
    models: Vec<ModelEntry>,
    current_model: String,
    selected: usize,
    list_state: ListState,
    hidden: bool,
    focused: bool,
    width: u16,
    height: u16,
}

impl ModelListSection {
    pub fn new(models: Vec<ModelEntry>, current_model: String) -> Self {
        let mut list_state = ListState::default();
        let selected = models
            .iter()
            .position(|m| m.name == current_model)
            .unwrap_or(0);
        if !models.is_empty() {
            list_state.select(Some(selected));
        }
        ModelListSection {
            models,
            current_model,
            selected,
            list_state,
            hidden: false,
            focused: false,
            width: 0,
            height: 0,
        }
    }

    #[cfg(test)]
    pub fn selected(&self) -> usize {
        self.selected
    }

    fn handle_key(&mut self, event: &TuiEvent) -> (bool, Vec<Command>) {
        match event {
            TuiEvent::CursorUp => {
                if !self.models.is_empty() {
                    self.selected = self.selected.saturating_sub(1);
                    self.list_state.select(Some(self.selected));
                }
                (true, Vec::new())
            }
            TuiEvent::CursorDown => {
                if !self.models.is_empty() {
                    self.selected = (self.selected + 1).min(self.models.len() - 1);
                    self.list_state.select(Some(self.selected));
                }
                (true, Vec::new())
            }
            TuiEvent::Submit => {
                let commands = match self.models.get(self.selected) {
                    Some(model) => vec![
                        Command::Broadcast(Msg::ModelSelected(model.name.clone())),
                        Command::ClosePage,
                    ],
                    None => Vec::new(),
                };
                (true, commands)
            }
            _ => (false, Vec::new()),
        }
    }
}

impl Section for ModelListSection {
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
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Models ")
            .title_bottom(Line::from(" Enter Select  Esc Back ").centered())
            .padding(Padding::horizontal(1));

        let items: Vec<ListItem> = self
            .models
            .iter()
            .enumerate()
            .map(|(i, model)| {
                let is_active = model.name == self.current_model;
                let platform_tag = format!("[{}]", model.platform);
                let active_marker = if is_active { " *" } else { "" };

                let style = if i == self.selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if is_active {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let platform_color = match model.platform {
                    Platform::Ollama => Color::Green,
                    Platform::OpenAi => Color::Yellow,
                };

                ListItem::new(Line::from(vec![
                    Span::styled(
                        platform_tag,
                        if i == self.selected {
                            style
                        } else {
                            Style::default().fg(platform_color)
                        },
                    ),
                    Span::styled(format!("  {}{}", model.name, active_marker), style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn set_dimensions(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}
