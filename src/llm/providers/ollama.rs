//! Ollama-style local inference server client.
//!
//! One `POST /api/chat` per turn carrying the full role-tagged history;
//! the response body is newline-delimited JSON, one object per delta,
//! terminated by an object whose `done` field is true. End-of-turn is that
//! `done` flag, not transport exhaustion; an early EOF is treated as
//! completion so a truncated stream still closes the turn cleanly.

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::llm::client::ChatClient;
use crate::llm::stream::{NdjsonStream, StreamHandle};
use crate::llm::types::{ChatMessage, ChatResponse, LlmError, Platform};

pub const DEFAULT_MODEL: &str = "llama3";

/// Models this platform serves. The local server will happily run anything
/// pulled into it; this is the set offered in the picker by default.
pub fn supported_models() -> Vec<&'static str> {
    vec![DEFAULT_MODEL, "llama3.1", "mistral"]
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// One NDJSON unit. Metrics fields on the terminal object are ignored.
#[derive(Deserialize, Debug)]
struct ChatChunk {
    #[serde(default)]
    message: ChunkMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

pub struct OllamaClient {
    base_url: String,
    http: reqwest::Client,
    model: String,
    messages: Vec<ChatMessage>,
    pending: String,
}

impl OllamaClient {
    /// `base_url` comes from the resolved host descriptor, e.g.
    /// `http://127.0.0.1:11434`. Port validation happened at startup.
    pub fn new(base_url: String) -> Self {
        OllamaClient {
            base_url,
            http: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
            messages: Vec::new(),
            pending: String::new(),
        }
    }

    fn finish_turn(&mut self) {
        let text = std::mem::take(&mut self.pending);
        self.messages.push(ChatMessage::assistant(text));
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    fn platform(&self) -> Platform {
        Platform::Ollama
    }

    async fn prompt(&mut self, text: &str) -> Result<StreamHandle, LlmError> {
        // An abandoned turn (handle closed before done) leaves partial
        // accumulation behind; a new turn starts from nothing.
        self.pending.clear();
        self.messages.push(ChatMessage::user(text));
        let request = ChatRequest {
            model: &self.model,
            messages: &self.messages,
            stream: true,
        };

        info!(
            "ollama chat request: model={}, history_len={}",
            self.model,
            self.messages.len()
        );

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .header("Accept", "application/x-ndjson")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        debug!("ollama response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("ollama API error: {} - {}", status, message);
            return Err(LlmError::Api { status, message });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| match chunk {
                Ok(b) => Ok(b.to_vec()),
                Err(e) => Err(LlmError::Transport(e.to_string())),
            });
        Ok(Box::new(NdjsonStream::new(bytes)))
    }

    async fn get_delta(
        &mut self,
        mut stream: StreamHandle,
    ) -> Result<(ChatResponse, StreamHandle), LlmError> {
        let more = match stream.scan().await {
            Ok(more) => more,
            Err(err) => {
                // The reader closed itself; drop the half-built turn text.
                self.pending.clear();
                return Err(err);
            }
        };

        if !more {
            // EOF without a done-flagged object. Close the turn anyway.
            debug!("ollama stream ended before done flag");
            self.finish_turn();
            return Ok((
                ChatResponse {
                    done: true,
                    text: String::new(),
                },
                stream,
            ));
        }

        let chunk: ChatChunk = match serde_json::from_slice(stream.bytes()) {
            Ok(chunk) => chunk,
            Err(e) => {
                stream.close();
                self.pending.clear();
                return Err(LlmError::Protocol(format!("bad NDJSON unit: {e}")));
            }
        };

        // The terminal object usually carries no content, but trailing
        // content is honored when present.
        let text = chunk.message.content;
        self.pending.push_str(&text);
        if chunk.done {
            self.finish_turn();
        }
        Ok((
            ChatResponse {
                done: chunk.done,
                text,
            },
            stream,
        ))
    }

    fn set_model(&mut self, model: &str) {
        debug!("ollama model set to {model}");
        self.model = model.to_string();
    }

    fn history(&self) -> &[ChatMessage] {
        &self.messages
    }
}
