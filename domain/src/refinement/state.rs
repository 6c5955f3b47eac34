//! Per-loop refinement state and the stop decision.
//!
//! ```text
//! Init ──▶ Evaluating ──▶ Stop(reason)
//!              ▲    │
//!              │    ▼
//!              └─ Continue (questions → regenerate → merge)
//! ```

use super::depth::DepthProfile;
use crate::evaluation::{AgentResult, ClarityReport, Gap, TokenUsage};
use std::collections::BTreeSet;
use std::fmt;

/// Why a refinement loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ClarityReached,
    NoNewGaps,
    NoQuestions,
    MaxIterations,
    RefinementSkipped,
    TokenBudget,
}

impl StopReason {
    /// Evaluate the stop conditions in order; the first that holds wins.
    pub fn check(
        state: &RefinementState,
        profile: &DepthProfile,
        new_gaps: &[Gap],
        questions: &[String],
    ) -> Option<StopReason> {
        if state.clarity_score >= profile.clarity_threshold {
            Some(StopReason::ClarityReached)
        } else if new_gaps.is_empty() {
            Some(StopReason::NoNewGaps)
        } else if questions.is_empty() {
            Some(StopReason::NoQuestions)
        } else if state.iteration >= profile.max_iterations {
            Some(StopReason::MaxIterations)
        } else if profile.skip_self_refinement {
            Some(StopReason::RefinementSkipped)
        } else if state.tokens.total >= profile.token_budget {
            Some(StopReason::TokenBudget)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::ClarityReached => "clarity_reached",
            StopReason::NoNewGaps => "no_new_gaps",
            StopReason::NoQuestions => "no_questions",
            StopReason::MaxIterations => "max_iterations",
            StopReason::RefinementSkipped => "refinement_skipped",
            StopReason::TokenBudget => "token_budget",
        }
    }

    /// Human-readable note, e.g. `stopped at iteration 3: clarity 82% ≥ threshold 80%`.
    pub fn note(&self, state: &RefinementState, profile: &DepthProfile) -> String {
        let why = match self {
            StopReason::ClarityReached => format!(
                "clarity {:.0}% ≥ threshold {:.0}%",
                state.clarity_score, profile.clarity_threshold
            ),
            StopReason::NoNewGaps => format!(
                "no new gaps (clarity {:.0}%)",
                state.clarity_score
            ),
            StopReason::NoQuestions => "no follow-up questions for remaining gaps".to_string(),
            StopReason::MaxIterations => format!(
                "iteration limit {} reached (clarity {:.0}%)",
                profile.max_iterations, state.clarity_score
            ),
            StopReason::RefinementSkipped => format!(
                "self-refinement disabled (clarity {:.0}%)",
                state.clarity_score
            ),
            StopReason::TokenBudget => format!(
                "token budget {} exhausted ({} used)",
                profile.token_budget, state.tokens.total
            ),
        };
        format!("stopped at iteration {}: {}", state.iteration, why)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable state of one self-refinement loop
///
/// Owned by exactly one loop invocation and dropped when it returns. The
/// seen-gap set only holds deterministic gap messages, so it is bounded by
/// pillars × gap kinds × severities.
#[derive(Debug, Clone)]
pub struct RefinementState {
    pub iteration: usize,
    pub clarity_score: f64,
    gaps_seen: BTreeSet<String>,
    remaining_gaps: Vec<String>,
    current: AgentResult,
    tokens: TokenUsage,
    notes: Vec<String>,
}

impl RefinementState {
    /// Start from the initial (iteration 0) result.
    pub fn new(initial: AgentResult, usage: TokenUsage) -> Self {
        Self {
            iteration: 0,
            clarity_score: 0.0,
            gaps_seen: BTreeSet::new(),
            remaining_gaps: Vec::new(),
            current: initial,
            tokens: usage,
            notes: Vec::new(),
        }
    }

    pub fn current(&self) -> &AgentResult {
        &self.current
    }

    pub fn tokens(&self) -> TokenUsage {
        self.tokens
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn gaps_seen(&self) -> usize {
        self.gaps_seen.len()
    }

    /// Record a clarity report; returns the gaps not seen in earlier cycles.
    pub fn observe(&mut self, report: &ClarityReport) -> Vec<Gap> {
        self.clarity_score = report.score;
        self.remaining_gaps = report.gap_messages();
        report
            .gaps
            .iter()
            .filter(|gap| self.gaps_seen.insert(gap.message.clone()))
            .cloned()
            .collect()
    }

    /// Merge a refined candidate: the longer `details` wins, ties keep the incumbent.
    ///
    /// Returns whether the candidate replaced the incumbent.
    pub fn merge(&mut self, candidate: AgentResult, usage: TokenUsage, questions: usize) -> bool {
        self.tokens += usage;
        self.iteration += 1;

        let replaced =
            candidate.details.chars().count() > self.current.details.chars().count();
        if replaced {
            self.current = candidate;
        }
        self.notes.push(format!(
            "iteration {}: clarity {:.0}%, {} question(s) asked, {} result",
            self.iteration,
            self.clarity_score,
            questions,
            if replaced { "adopted refined" } else { "kept previous" }
        ));
        replaced
    }

    /// Consume the state and annotate the final result.
    pub fn finish(mut self, reason: StopReason, profile: &DepthProfile) -> AgentResult {
        let note = reason.note(&self, profile);
        self.notes.push(note);

        let mut result = self.current;
        result.internal_iterations = self.iteration;
        result.clarity_score = self.clarity_score;
        result.token_usage = self.tokens;
        result.missing_information = self.remaining_gaps;
        result.refinement_notes = self.notes;
        result
    }
}
