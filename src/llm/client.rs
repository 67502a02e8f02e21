use async_trait::async_trait;

use crate::llm::stream::StreamHandle;
use crate::llm::types::{ChatMessage, ChatResponse, LlmError, Platform};

/// Everything a platform backend must be able to do.
///
/// A client owns its conversation history exclusively. Switching platforms
/// swaps the active client and therefore the visible history; nothing is
/// merged across providers.
#[async_trait]
pub trait ChatClient: Send {
    /// The platform this client belongs to.
    fn platform(&self) -> Platform;

    /// Appends `text` as a user turn and issues the network request with
    /// the entire accumulated history (neither wire protocol supports
    /// partial context updates). Returns the open response stream.
    async fn prompt(&mut self, text: &str) -> Result<StreamHandle, LlmError>;

    /// Pulls exactly one unit from the stream and normalizes it.
    ///
    /// On `done`, the accumulated assistant text is appended to history as
    /// one turn (exactly once per turn) and the accumulation buffer is
    /// reset. On error the stream has been closed before the error is
    /// returned, so the caller never holds a live handle for a dead turn.
    async fn get_delta(
        &mut self,
        stream: StreamHandle,
    ) -> Result<(ChatResponse, StreamHandle), LlmError>;

    /// Switches the model used by subsequent prompts. History is a
    /// property of the client instance, not the model, and is kept.
    fn set_model(&mut self, model: &str);

    /// The history accumulated through this client, oldest first.
    fn history(&self) -> &[ChatMessage];
}
