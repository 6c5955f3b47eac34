//! Evaluation parameters for use case control.
//!
//! [`EvaluationParams`] groups the static parameters that control one
//! council run: refinement depth, number of rounds, concurrency, timeouts
//! and retrieval. These are application-layer concerns, not domain policy.

use council_domain::DepthProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Council run control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationParams {
    /// Refinement policy applied to every agent loop.
    pub depth: DepthProfile,
    /// Total rounds including the initial round (at least 1).
    pub rounds: usize,
    /// Run agents within a round concurrently.
    pub concurrent: bool,
    /// Run the synthesis step after the final round.
    pub synthesize: bool,
    /// Output token cap per generation call.
    pub max_output_tokens: u32,
    /// Per-generation timeout; an expired call counts as a failed cycle.
    pub generation_timeout: Option<Duration>,
    /// Diffs larger than this (bytes) are retrieved rather than sent whole.
    pub large_diff_threshold: usize,
    /// Excerpts requested per retrieval query.
    pub retrieval_top_k: usize,
    /// Also query project documentation during retrieval.
    pub retrieve_docs: bool,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            depth: DepthProfile::normal(),
            rounds: 3,
            concurrent: true,
            synthesize: true,
            max_output_tokens: 2048,
            generation_timeout: Some(Duration::from_secs(120)),
            large_diff_threshold: 40_000,
            retrieval_top_k: 4,
            retrieve_docs: false,
        }
    }
}

impl EvaluationParams {
    /// Index of the final round.
    pub fn final_round(&self) -> usize {
        self.rounds.max(1) - 1
    }

    // ==================== Builder Methods ====================

    pub fn with_depth(mut self, depth: DepthProfile) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn with_synthesis(mut self, synthesize: bool) -> Self {
        self.synthesize = synthesize;
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_large_diff_threshold(mut self, bytes: usize) -> Self {
        self.large_diff_threshold = bytes;
        self
    }

    pub fn with_retrieval(mut self, top_k: usize, docs: bool) -> Self {
        self.retrieval_top_k = top_k;
        self.retrieve_docs = docs;
        self
    }
}
