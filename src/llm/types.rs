use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend implementation family. Each platform owns one `ChatClient`
/// implementation and one set of endpoint conventions.
///
/// New platforms are added by registering a constructor in
/// `registry::ClientRegistry`, not by touching existing dispatch logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// OpenAI-compatible cloud API (authenticated HTTPS, SSE stream).
    OpenAi,
    /// Ollama-style local inference server (plain HTTP, NDJSON stream).
    Ollama,
}

impl Platform {
    /// Stable lowercase tag, used in config files and the model picker.
    pub fn tag(self) -> &'static str {
        match self {
            Platform::OpenAi => "openai",
            Platform::Ollama => "ollama",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Platform> {
        match tag {
            "openai" => Some(Platform::OpenAi),
            "ollama" => Some(Platform::Ollama),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A selectable model together with its owning platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub name: String,
    pub platform: Platform,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of conversation history. History is owned by exactly one
/// client instance and is append-only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One normalized unit of streamed response. `text` is the incremental
/// delta for this unit (possibly empty); `done` means the stream has no
/// more units and must not be scanned again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub done: bool,
    pub text: String,
}

/// Errors surfaced by provider clients and stream readers.
/// None of these are retried automatically; the turn owner decides.
#[derive(Debug)]
pub enum LlmError {
    /// Provider misconfigured (missing API key, unknown model). Startup or
    /// selection time, never mid-stream.
    Config(String),
    /// Network-level failure (DNS, refused connection, broken stream).
    Transport(String),
    /// The API answered with an error status.
    Api { status: u16, message: String },
    /// A stream unit could not be parsed; aborts the turn.
    Protocol(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Config(msg) => write!(f, "config error: {msg}"),
            LlmError::Transport(msg) => write!(f, "transport error: {msg}"),
            LlmError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            LlmError::Protocol(msg) => write!(f, "protocol error: {msg}"),
        }
    }
}

impl std::error::Error for LlmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_tag_round_trip() {
        for platform in [Platform::OpenAi, Platform::Ollama] {
            assert_eq!(Platform::from_tag(platform.tag()), Some(platform));
        }
        assert_eq!(Platform::from_tag("chatgpt"), None);
    }

    #[test]
    fn test_chat_message_serializes_lowercase_roles() {
        let msg = ChatMessage {
            role: Role::Assistant,
            content: "hi".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_error_display() {
        let err = LlmError::Api {
            status: 401,
            message: "bad key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 401): bad key");
    }
}
