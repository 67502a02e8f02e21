//! # Turn Lifecycle
//!
//! Tracks where the conversation is inside a single request/response
//! cycle. Exactly one turn may be in flight: a submit while busy is
//! rejected, an empty submit is ignored, and a failed turn returns the
//! session to a state that accepts the next submit.
//!
//! Cancellation is cooperative. `request_cancel` only raises a flag; the
//! delta loop observes it between pulls and closes the stream, so a cancel
//! takes effect at a unit boundary, never mid-unit.

use log::debug;

/// Where the active turn is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn in flight; submits are accepted.
    Idle,
    /// A prompt was accepted and its request is being opened.
    Prompted,
    /// The response stream is open and deltas are arriving.
    Streaming,
    /// The last turn ended in an error. Accepts submits like `Idle`;
    /// kept distinct so the UI can show what happened.
    Failed,
}

/// Why a submit did not start a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Whitespace-only input. Not an error, just a no-op.
    Empty,
    /// A turn is already in flight.
    Busy,
}

#[derive(Debug)]
pub struct TurnSession {
    phase: TurnPhase,
    cancel_requested: bool,
}

impl Default for TurnSession {
    fn default() -> Self {
        TurnSession {
            phase: TurnPhase::Idle,
            cancel_requested: false,
        }
    }
}

impl TurnSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// A turn is in flight between submit and close/fail.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, TurnPhase::Prompted | TurnPhase::Streaming)
    }

    /// Accepts `text` as the next prompt, returning the trimmed text to
    /// send. Empty input and submits while busy are rejected.
    pub fn submit(&mut self, text: &str) -> Result<String, SubmitRejection> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SubmitRejection::Empty);
        }
        if self.is_busy() {
            debug!("submit rejected: turn already in flight");
            return Err(SubmitRejection::Busy);
        }
        self.phase = TurnPhase::Prompted;
        self.cancel_requested = false;
        Ok(trimmed.to_string())
    }

    /// The request succeeded and the response stream is open.
    pub fn stream_opened(&mut self) {
        debug_assert_eq!(self.phase, TurnPhase::Prompted);
        self.phase = TurnPhase::Streaming;
    }

    /// The turn completed; the session accepts the next submit.
    pub fn finish(&mut self) {
        self.phase = TurnPhase::Idle;
        self.cancel_requested = false;
    }

    /// The turn errored. The session accepts the next submit.
    pub fn fail(&mut self) {
        self.phase = TurnPhase::Failed;
        self.cancel_requested = false;
    }

    /// Asks the in-flight turn to stop at the next unit boundary. Returns
    /// whether there was a turn to cancel.
    pub fn request_cancel(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        debug!("cancel requested");
        self.cancel_requested = true;
        true
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_submit_is_ignored() {
        let mut session = TurnSession::new();
        assert_eq!(session.submit("   "), Err(SubmitRejection::Empty));
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    #[test]
    fn test_submit_trims_and_starts_turn() {
        let mut session = TurnSession::new();
        assert_eq!(session.submit("  hello  "), Ok("hello".to_string()));
        assert_eq!(session.phase(), TurnPhase::Prompted);
        assert!(session.is_busy());
    }

    #[test]
    fn test_submit_while_busy_is_rejected() {
        let mut session = TurnSession::new();
        session.submit("first").unwrap();
        assert_eq!(session.submit("second"), Err(SubmitRejection::Busy));
        session.stream_opened();
        assert_eq!(session.submit("third"), Err(SubmitRejection::Busy));
    }

    #[test]
    fn test_finish_returns_to_idle() {
        let mut session = TurnSession::new();
        session.submit("hello").unwrap();
        session.stream_opened();
        session.finish();
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert!(session.submit("again").is_ok());
    }

    #[test]
    fn test_failed_turn_accepts_next_submit() {
        let mut session = TurnSession::new();
        session.submit("hello").unwrap();
        session.fail();
        assert_eq!(session.phase(), TurnPhase::Failed);
        assert!(!session.is_busy());
        assert!(session.submit("retry").is_ok());
    }

    #[test]
    fn test_cancel_only_applies_to_inflight_turn() {
        let mut session = TurnSession::new();
        assert!(!session.request_cancel());
        session.submit("hello").unwrap();
        assert!(session.request_cancel());
        assert!(session.cancel_requested());
    }

    #[test]
    fn test_new_submit_clears_stale_cancel() {
        let mut session = TurnSession::new();
        session.submit("hello").unwrap();
        session.request_cancel();
        session.finish();
        session.submit("next").unwrap();
        assert!(!session.cancel_requested());
    }
}
