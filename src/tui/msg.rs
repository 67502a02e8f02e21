//! Messages and commands that drive the dispatch loop.
//!
//! Turn state travels BY VALUE: the client and the open stream handle ride
//! inside message/command payloads between the loop thread and spawned
//! tasks, so no lock is ever held across an await and one-turn-per-client
//! is enforced structurally.

use std::fmt;

use crate::llm::client::ChatClient;
use crate::llm::stream::StreamHandle;
use crate::llm::types::{ChatResponse, LlmError};
use crate::tui::event::TuiEvent;
use crate::tui::pages::PageName;

/// Everything a section can be told. Result messages are consumed (taken)
/// by exactly one section; broadcasts are observed by reference.
pub enum Msg {
    /// The prompt section accepted input. Consumed by the conversation
    /// section.
    PromptSubmitted(String),
    /// A model was picked. Broadcast; observed by reference.
    ModelSelected(String),
    /// The registry applied a selection. Broadcast; a mid-turn pick never
    /// produces one.
    ModelSwitched(String),
    /// `prompt` succeeded; the response stream is open.
    StreamOpened {
        client: Box<dyn ChatClient>,
        stream: StreamHandle,
    },
    /// One `get_delta` pull resolved.
    StreamDelta {
        client: Box<dyn ChatClient>,
        stream: StreamHandle,
        response: ChatResponse,
    },
    /// The turn aborted. The stream was already closed by the client.
    TurnFailed {
        client: Box<dyn ChatClient>,
        error: LlmError,
    },
    /// A key event routed to the current page.
    Key(TuiEvent),
}

impl fmt::Debug for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Msg::PromptSubmitted(text) => write!(f, "PromptSubmitted({} chars)", text.len()),
            Msg::ModelSelected(model) => write!(f, "ModelSelected({model:?})"),
            Msg::ModelSwitched(model) => write!(f, "ModelSwitched({model:?})"),
            Msg::StreamOpened { .. } => write!(f, "StreamOpened"),
            Msg::StreamDelta { response, .. } => write!(
                f,
                "StreamDelta(done={}, {} bytes)",
                response.done,
                response.text.len()
            ),
            Msg::TurnFailed { error, .. } => write!(f, "TurnFailed({error})"),
            Msg::Key(event) => write!(f, "Key({event:?})"),
        }
    }
}

/// Work a section asks the loop to do. Async commands resolve into a
/// future `Msg` posted to the loop's inbox.
pub enum Command {
    /// Issue `client.prompt(prompt)` in a task; resolves to `StreamOpened`
    /// or `TurnFailed`.
    OpenStream {
        client: Box<dyn ChatClient>,
        prompt: String,
    },
    /// Issue one `client.get_delta(stream)` in a task; resolves to
    /// `StreamDelta` or `TurnFailed`. Issued strictly one-at-a-time per
    /// turn.
    ReadDelta {
        client: Box<dyn ChatClient>,
        stream: StreamHandle,
    },
    /// Close the handle on the loop thread. Idempotent.
    CloseStream(StreamHandle),
    /// Deliver a message to every page.
    Broadcast(Msg),
    OpenPage(PageName),
    ClosePage,
    Quit,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::OpenStream { prompt, .. } => {
                write!(f, "OpenStream({} chars)", prompt.len())
            }
            Command::ReadDelta { .. } => write!(f, "ReadDelta"),
            Command::CloseStream(_) => write!(f, "CloseStream"),
            Command::Broadcast(msg) => write!(f, "Broadcast({msg:?})"),
            Command::OpenPage(name) => write!(f, "OpenPage({name:?})"),
            Command::ClosePage => write!(f, "ClosePage"),
            Command::Quit => write!(f, "Quit"),
        }
    }
}
