//! Progress notification port
//!
//! Defines the interface for reporting progress during an evaluation.

/// Callback for progress updates during an evaluation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain log lines, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a round starts
    fn on_round_start(&self, round: usize, total_agents: usize, is_final: bool);

    /// Called when one agent finishes its refinement loop for a round
    fn on_agent_complete(&self, round: usize, agent: &str, clarity: f64, success: bool);

    /// Called when a round completes
    fn on_round_complete(&self, round: usize);

    /// Called around the synthesis step
    fn on_synthesis_start(&self) {}

    fn on_synthesis_complete(&self, _generated: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_round_start(&self, _round: usize, _total_agents: usize, _is_final: bool) {}
    fn on_agent_complete(&self, _round: usize, _agent: &str, _clarity: f64, _success: bool) {}
    fn on_round_complete(&self, _round: usize) {}
}
