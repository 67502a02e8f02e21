//! # Conversation Section
//!
//! Owns the transcript, the turn state machine, and the client registry.
//! All turn state mutation happens here, on the loop thread; the network
//! work it requests comes back as result messages that it alone consumes.
//!
//! Scrollback: new deltas keep the view pinned to the bottom until the
//! user scrolls up; End re-pins it.

use log::{debug, warn};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::core::session::{SubmitRejection, TurnSession};
use crate::llm::registry::ClientRegistry;
use crate::tui::event::TuiEvent;
use crate::tui::msg::{Command, Msg};
use crate::tui::sections::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug)]
pub struct TranscriptBlock {
    pub speaker: Speaker,
    /// "You" for user turns, the model name for assistant turns.
    pub label: String,
    pub text: String,
}

pub struct ConvoSection {
    registry: ClientRegistry,
    session: TurnSession,
    blocks: Vec<TranscriptBlock>,
    scroll: u16,
    stick_to_bottom: bool,
    hidden: bool,
    focused: bool,
    width: u16,
    height: u16,
}

impl ConvoSection {
    pub fn new(registry: ClientRegistry) -> Self {
        ConvoSection {
            registry,
            session: TurnSession::new(),
            blocks: Vec::new(),
            scroll: 0,
            stick_to_bottom: true,
            hidden: false,
            focused: false,
            width: 0,
            height: 0,
        }
    }

    #[cfg(test)]
    pub fn blocks(&self) -> &[TranscriptBlock] {
        &self.blocks
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    #[cfg(test)]
    pub fn current_model(&self) -> &str {
        self.registry.current_model()
    }

    fn append_to_pending(&mut self, text: &str) {
        if let Some(block) = self.blocks.last_mut() {
            debug_assert_eq!(block.speaker, Speaker::Assistant);
            block.text.push_str(text);
        }
    }

    fn start_turn(&mut self, text: &str) -> Vec<Command> {
        let prompt = match self.session.submit(text) {
            Ok(prompt) => prompt,
            Err(SubmitRejection::Empty) => return Vec::new(),
            Err(SubmitRejection::Busy) => {
                debug!("prompt dropped: turn already in flight");
                return Vec::new();
            }
        };

        // The user turn lands in the transcript before any network work.
        self.blocks.push(TranscriptBlock {
            speaker: Speaker::User,
            label: "You".to_string(),
            text: prompt.clone(),
        });
        self.blocks.push(TranscriptBlock {
            speaker: Speaker::Assistant,
            label: self.registry.current_model().to_string(),
            text: String::new(),
        });
        self.stick_to_bottom = true;

        match self.registry.checkout() {
            Some(client) => vec![Command::OpenStream { client, prompt }],
            None => {
                // Busy-reject above makes this unreachable in practice.
                warn!("no client available for turn");
                self.append_to_pending("[error: no client available]");
                self.session.fail();
                Vec::new()
            }
        }
    }

    fn handle_key(&mut self, event: &TuiEvent) -> bool {
        match event {
            // Scrolling works regardless of focus.
            TuiEvent::CursorUp => {
                self.scroll = self.scroll.saturating_sub(1);
                self.stick_to_bottom = false;
                true
            }
            TuiEvent::CursorDown => {
                self.scroll = self.scroll.saturating_add(1);
                true
            }
            TuiEvent::ScrollPageUp => {
                self.scroll = self.scroll.saturating_sub(self.height.max(1));
                self.stick_to_bottom = false;
                true
            }
            TuiEvent::ScrollPageDown => {
                self.scroll = self.scroll.saturating_add(self.height.max(1));
                true
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                true
            }
            TuiEvent::Back if self.session.is_busy() => {
                self.session.request_cancel();
                true
            }
            _ => false,
        }
    }
}

impl Section for ConvoSection {
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
        // Broadcasts first: observed by reference, left in place.
        if let Some(Msg::ModelSelected(model)) = msg {
            if self.session.is_busy() {
                debug!("model switch ignored mid-turn: {model}");
                return Vec::new();
            }
            return match self.registry.select_model(model) {
                // Confirm only an applied switch; an ignored or failed
                // pick leaves the rest of the UI on the old model.
                Ok(_) => vec![Command::Broadcast(Msg::ModelSwitched(model.clone()))],
                Err(e) => {
                    warn!("model selection failed: {e}");
                    Vec::new()
                }
            };
        }
        if let Some(Msg::Key(event)) = msg {
            if self.handle_key(&event.clone()) {
                msg.take();
            }
            return Vec::new();
        }

        // Result messages: this section is their one owner.
        match msg.take() {
            Some(Msg::PromptSubmitted(text)) => self.start_turn(&text),
            Some(Msg::StreamOpened { client, stream }) => {
                if self.session.cancel_requested() {
                    self.append_to_pending("[cancelled]");
                    self.session.finish();
                    self.registry.check_in(client);
                    return vec![Command::CloseStream(stream)];
                }
                self.session.stream_opened();
                vec![Command::ReadDelta { client, stream }]
            }
            Some(Msg::StreamDelta {
                client,
                stream,
                response,
            }) => {
                if self.session.cancel_requested() {
                    self.append_to_pending(" [cancelled]");
                    self.session.finish();
                    self.registry.check_in(client);
                    return vec![Command::CloseStream(stream)];
                }
                self.append_to_pending(&response.text);
                if response.done {
                    self.session.finish();
                    self.registry.check_in(client);
                    return vec![Command::CloseStream(stream)];
                }
                vec![Command::ReadDelta { client, stream }]
            }
            Some(Msg::TurnFailed { client, error }) => {
                warn!("turn failed: {error}");
                self.append_to_pending(&format!("[error: {error}]"));
                self.session.fail();
                self.registry.check_in(client);
                Vec::new()
            }
            other => {
                // Not ours; put it back.
                *msg = other;
                Vec::new()
            }
        }
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
            .title(format!(" {} ", self.registry.current_model()));

        let wrap_width = area.width.saturating_sub(2).max(1) as usize;
        let mut lines: Vec<Line> = Vec::new();
        for entry in &self.blocks {
            let label_style = match entry.speaker {
                Speaker::User => Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                Speaker::Assistant => Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            };
            lines.push(Line::from(Span::styled(
                format!("{}:", entry.label),
                label_style,
            )));
            for wrapped in textwrap::wrap(&entry.text, wrap_width) {
                lines.push(Line::from(wrapped.into_owned()));
            }
            lines.push(Line::default());
        }

        let inner_height = area.height.saturating_sub(2);
        let max_scroll = (lines.len() as u16).saturating_sub(inner_height);
        if self.stick_to_bottom {
            self.scroll = max_scroll;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }

        let paragraph = Paragraph::new(lines)
            .scroll((self.scroll, 0))
            .block(block);
        frame.render_widget(paragraph, area);
    }

    fn set_dimensions(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}
