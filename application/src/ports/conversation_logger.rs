//! Port for the evaluation transcript.
//!
//! Defines the [`ConversationLogger`] trait for recording evaluation events
//! (prompts sent, responses received, clarity evaluations, finished rounds)
//! to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! evaluation transcript in a machine-readable format (JSONL).

use serde_json::Value;

/// Event type identifiers emitted by the use cases.
pub mod event_types {
    pub const EVALUATION_STARTED: &str = "evaluation_started";
    pub const RETRIEVAL: &str = "retrieval";
    pub const PROMPT_SENT: &str = "prompt_sent";
    pub const RESPONSE_RECEIVED: &str = "response_received";
    pub const GENERATION_FAILED: &str = "generation_failed";
    pub const CYCLE_EVALUATED: &str = "cycle_evaluated";
    pub const REFINEMENT_STOPPED: &str = "refinement_stopped";
    pub const ROUND_COMPLETED: &str = "round_completed";
    pub const SYNTHESIS: &str = "synthesis";
    pub const EVALUATION_COMPLETED: &str = "evaluation_completed";
}

/// A structured evaluation event for logging.
///
/// The logger adds the timestamp when the event is written.
pub struct ConversationEvent {
    /// Event type identifier (see [`event_types`]).
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging evaluation events to a structured log.
///
/// `log` is synchronous and non-fallible; a failed write never disturbs
/// the evaluation.
pub trait ConversationLogger: Send + Sync {
    /// Record an evaluation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when the transcript is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
