//! OpenAI-compatible cloud API client.
//!
//! One authenticated `POST /chat/completions` per turn with the full
//! history; the response is a server-sent-event stream of
//! `chat.completion.chunk` objects ending with a `[DONE]` sentinel.
//!
//! Unlike the NDJSON transport, scanning here delegates to the
//! `eventsource-stream` iterator; `SseStream` exposes only the most recent
//! event's delta text as its bytes, so the session layer sees the same
//! scan/bytes/close contract on both platforms.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::llm::client::ChatClient;
use crate::llm::stream::{StreamHandle, StreamReader};
use crate::llm::types::{ChatMessage, ChatResponse, LlmError, Platform};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub fn supported_models() -> Vec<&'static str> {
    vec![DEFAULT_MODEL, "gpt-4", "gpt-4o"]
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// One `chat.completion.chunk` SSE payload. Only the delta text matters.
#[derive(Deserialize, Debug)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// StreamReader over the SSE event iterator. The `[DONE]` sentinel and
/// iterator exhaustion both normalize to `scan() == Ok(false)`, and the
/// sentinel never carries content.
struct SseStream {
    inner: Option<BoxStream<'static, Result<eventsource_stream::Event, LlmError>>>,
    payload: Vec<u8>,
}

impl SseStream {
    fn new(
        events: impl futures::Stream<Item = Result<eventsource_stream::Event, LlmError>>
            + Send
            + 'static,
    ) -> Self {
        SseStream {
            inner: Some(events.boxed()),
            payload: Vec::new(),
        }
    }
}

#[async_trait]
impl StreamReader for SseStream {
    async fn scan(&mut self) -> Result<bool, LlmError> {
        if self.inner.is_none() {
            self.payload.clear();
            return Ok(false);
        }

        let next = match self.inner.as_mut() {
            Some(inner) => inner.next().await,
            None => None,
        };
        match next {
            None => {
                self.close();
                Ok(false)
            }
            Some(Err(err)) => {
                self.close();
                Err(err)
            }
            Some(Ok(event)) => {
                if event.data.trim() == "[DONE]" {
                    self.close();
                    return Ok(false);
                }
                let chunk: ChunkResponse = serde_json::from_str(&event.data).map_err(|e| {
                    self.close();
                    LlmError::Protocol(format!("bad SSE chunk: {e}"))
                })?;
                let delta = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .unwrap_or_default();
                self.payload = delta.into_bytes();
                Ok(true)
            }
        }
    }

    fn bytes(&self) -> &[u8] {
        &self.payload
    }

    fn close(&mut self) {
        self.inner = None;
        self.payload.clear();
    }
}

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
    model: String,
    messages: Vec<ChatMessage>,
    pending: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        OpenAiClient {
            api_key,
            base_url,
            http: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
            messages: Vec::new(),
            pending: String::new(),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    fn platform(&self) -> Platform {
        Platform::OpenAi
    }

    async fn prompt(&mut self, text: &str) -> Result<StreamHandle, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::Config(
                "no OpenAI API key (set OPENAI_API_KEY or [openai] api_key)".to_string(),
            ));
        }

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
            "openai chat request: model={}, history_len={}",
            self.model,
            self.messages.len()
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        debug!("openai response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("openai API error: {} - {}", status, message);
            return Err(LlmError::Api { status, message });
        }

        let events = response.bytes_stream().eventsource().map(|event| {
            event.map_err(|e| LlmError::Transport(e.to_string()))
        });
        Ok(Box::new(SseStream::new(events)))
    }

    async fn get_delta(
        &mut self,
        mut stream: StreamHandle,
    ) -> Result<(ChatResponse, StreamHandle), LlmError> {
        let more = match stream.scan().await {
            Ok(more) => more,
            Err(err) => {
                self.pending.clear();
                return Err(err);
            }
        };
        let done = !more;

        let text = if done {
            // [DONE] or iterator exhaustion; the sentinel carries nothing.
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
        debug!("openai model set to {model}");
        self.model = model.to_string();
    }

    fn history(&self) -> &[ChatMessage] {
        &self.messages
    }
}
