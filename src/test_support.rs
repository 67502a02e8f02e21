//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::core::config::ResolvedConfig;
use crate::llm::client::ChatClient;
use crate::llm::stream::{StreamHandle, StreamReader};
use crate::llm::types::{ChatMessage, ChatResponse, LlmError, Platform};

/// A stream reader replaying canned units, for tests that never touch the
/// network.
pub struct MockStream {
    units: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    closed: bool,
}

impl MockStream {
    pub fn new(units: Vec<&str>) -> Self {
        MockStream {
            units: units.into_iter().map(|u| u.as_bytes().to_vec()).collect(),
            current: Vec::new(),
            closed: false,
        }
    }
}

#[async_trait]
impl StreamReader for MockStream {
    async fn scan(&mut self) -> Result<bool, LlmError> {
        if self.closed {
            self.current.clear();
            return Ok(false);
        }
        match self.units.pop_front() {
            Some(unit) => {
                self.current = unit;
                Ok(true)
            }
            None => {
                self.current.clear();
                Ok(false)
            }
        }
    }

    fn bytes(&self) -> &[u8] {
        &self.current
    }

    fn close(&mut self) {
        self.closed = true;
        self.units.clear();
        self.current.clear();
    }
}

/// A client that replays the same scripted deltas for every turn while
/// keeping real history semantics: a user turn on prompt, one accumulated
/// assistant turn on completion.
pub struct MockClient {
    platform: Platform,
    pub model: String,
    messages: Vec<ChatMessage>,
    script: Vec<String>,
    pending: String,
}

impl MockClient {
    pub fn new(platform: Platform, script: Vec<&str>) -> Self {
        MockClient {
            platform,
            model: "mock-model".to_string(),
            messages: Vec::new(),
            script: script.into_iter().map(str::to_string).collect(),
            pending: String::new(),
        }
    }
}

#[async_trait]
impl ChatClient for MockClient {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn prompt(&mut self, text: &str) -> Result<StreamHandle, LlmError> {
        self.pending.clear();
        self.messages.push(ChatMessage::user(text));
        let units: Vec<&str> = self.script.iter().map(String::as_str).collect();
        Ok(Box::new(MockStream::new(units)))
    }

    async fn get_delta(
        &mut self,
        mut stream: StreamHandle,
    ) -> Result<(ChatResponse, StreamHandle), LlmError> {
        let more = stream.scan().await?;
        let done = !more;
        let text = if done {
            let full = std::mem::take(&mut self.pending);
            self.messages.push(ChatMessage::assistant(full));
            String::new()
        } else {
            let delta = String::from_utf8_lossy(stream.bytes()).into_owned();
            self.pending.push_str(&delta);
            delta
        };
        Ok((ChatResponse { done, text }, stream))
    }

    fn set_model(&mut self, model: &str) {
        self.model = model.to_string();
    }

    fn history(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Constructor for the registry's dispatch table. Builds an
/// Ollama-platform mock that answers "hi" in one delta.
pub fn scripted_ctor(_config: &ResolvedConfig) -> Box<dyn ChatClient> {
    Box::new(MockClient::new(Platform::Ollama, vec!["hi"]))
}

/// Runs one full turn against a client: prompt, drain every delta, return
/// the concatenated text.
pub async fn run_turn(client: &mut dyn ChatClient, prompt: &str) -> Result<String, LlmError> {
    let mut stream = client.prompt(prompt).await?;
    let mut collected = String::new();
    loop {
        let (response, returned) = client.get_delta(stream).await?;
        stream = returned;
        collected.push_str(&response.text);
        if response.done {
            stream.close();
            return Ok(collected);
        }
    }
}
