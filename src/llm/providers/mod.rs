//! Platform backends. Each submodule is one wire protocol.

pub mod ollama;
pub mod openai;
