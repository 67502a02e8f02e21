//! Provider clients, streaming transports, and model routing.

pub mod client;
pub mod providers;
pub mod registry;
pub mod stream;
pub mod types;

pub use client::ChatClient;
pub use registry::ClientRegistry;
pub use stream::{StreamHandle, StreamReader};
pub use types::{ChatMessage, ChatResponse, LlmError, ModelEntry, Platform, Role};
