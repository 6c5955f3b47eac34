//! Round context handed to every agent's refinement loop.

use crate::evaluation::AgentResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A free-text objection raised by one agent in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamConcern {
    pub agent_name: String,
    pub concern: String,
    pub round: usize,
}

impl TeamConcern {
    pub fn new(agent_name: impl Into<String>, concern: impl Into<String>, round: usize) -> Self {
        Self {
            agent_name: agent_name.into(),
            concern: concern.into(),
            round,
        }
    }
}

impl fmt::Display for TeamConcern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, round {}] {}", self.agent_name, self.round, self.concern)
    }
}

/// What one round tells each agent about the team
///
/// Round 0 carries no team context. Discussion rounds carry every
/// prior-round result (all agents, including the recipient) and the
/// concerns still open.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundContext {
    pub round_index: usize,
    pub is_final_round: bool,
    pub prior_results: Vec<AgentResult>,
    pub team_concerns: Vec<TeamConcern>,
}

impl RoundContext {
    /// Context for round 0.
    pub fn initial(is_final_round: bool) -> Self {
        Self {
            round_index: 0,
            is_final_round,
            prior_results: Vec::new(),
            team_concerns: Vec::new(),
        }
    }

    /// Context for a discussion round (index >= 1).
    pub fn discussion(
        round_index: usize,
        is_final_round: bool,
        prior_results: Vec<AgentResult>,
        team_concerns: Vec<TeamConcern>,
    ) -> Self {
        Self {
            round_index,
            is_final_round,
            prior_results,
            team_concerns,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.round_index == 0
    }

    /// The recipient's own result from the previous round, if any.
    pub fn own_previous(&self, agent_name: &str) -> Option<&AgentResult> {
        self.prior_results
            .iter()
            .find(|r| r.agent_name == agent_name)
    }

    /// Open concerns raised by agents other than `agent_name`.
    pub fn concerns_from_others(&self, agent_name: &str) -> Vec<&TeamConcern> {
        self.team_concerns
            .iter()
            .filter(|c| c.agent_name != agent_name)
            .collect()
    }
}
