//! # Core Application Logic
//!
//! UI-free building blocks: configuration resolution and the turn
//! lifecycle. The TUI layer consumes these; nothing here knows about
//! terminals or rendering.
//!
//! ## Modules
//!
//! - [`config`]: load/resolve settings (file, env, CLI) and host parsing
//! - [`session`]: the single-turn-in-flight state machine

pub mod config;
pub mod session;

pub use config::{ConfigError, ResolvedConfig};
pub use session::{SubmitRejection, TurnPhase, TurnSession};
