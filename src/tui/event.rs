//! Keyboard polling and translation into TUI-level events.

use crossterm::event::{self, Event, KeyCode, KeyModifiers};

/// TUI-specific input events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// Ctrl+C: quit unconditionally.
    ForceQuit,
    /// Esc: close the top page, or cancel an in-flight turn on the chat page.
    Back,
    /// Ctrl+G: open the help page.
    Help,
    /// Ctrl+P: open the model-selection page.
    Models,
    /// Tab: move focus to the next visible section.
    FocusNext,
    /// Enter.
    Submit,
    InputChar(char),
    /// Bracketed paste - preserves newlines.
    Paste(String),
    Backspace,
    CursorUp,
    CursorDown,
    ScrollPageUp,
    ScrollPageDown,
    /// End key - also re-enables stick-to-bottom.
    ScrollToBottom,
    Resize,
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: std::time::Duration) -> Option<TuiEvent> {
    if !event::poll(timeout).ok()? {
        return None;
    }
    match event::read().ok()? {
        Event::Key(key_event) => {
            log::debug!(
                "Key event: {:?} with modifiers {:?}",
                key_event.code,
                key_event.modifiers
            );
            match (key_event.modifiers, key_event.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
                (KeyModifiers::CONTROL, KeyCode::Char('g')) => Some(TuiEvent::Help),
                (KeyModifiers::CONTROL, KeyCode::Char('p')) => Some(TuiEvent::Models),
                (_, KeyCode::Tab) => Some(TuiEvent::FocusNext),
                (_, KeyCode::Esc) => Some(TuiEvent::Back),
                (_, KeyCode::Enter) => Some(TuiEvent::Submit),
                (_, KeyCode::Char(c)) => Some(TuiEvent::InputChar(c)),
                (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
                (_, KeyCode::Up) => Some(TuiEvent::CursorUp),
                (_, KeyCode::Down) => Some(TuiEvent::CursorDown),
                (_, KeyCode::PageUp) => Some(TuiEvent::ScrollPageUp),
                (_, KeyCode::PageDown) => Some(TuiEvent::ScrollPageDown),
                (_, KeyCode::End) => Some(TuiEvent::ScrollToBottom),
                _ => None,
            }
        }
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}
