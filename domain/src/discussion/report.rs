//! Evaluation report: the full record of one council run.

use super::context::TeamConcern;
use super::synthesis::FinalSynthesis;
use crate::evaluation::{AgentResult, TokenUsage};
use crate::pillar::PillarScores;
use serde::{Deserialize, Serialize};

/// All agents' results for one round, in roster order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub round: usize,
    pub results: Vec<AgentResult>,
}

impl RoundRecord {
    pub fn new(round: usize, results: Vec<AgentResult>) -> Self {
        Self { round, results }
    }

    pub fn result_for(&self, agent_name: &str) -> Option<&AgentResult> {
        self.results.iter().find(|r| r.agent_name == agent_name)
    }

    pub fn token_usage(&self) -> TokenUsage {
        self.results.iter().map(|r| r.token_usage).sum()
    }
}

/// Outcome of a full evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub agents: Vec<String>,
    pub rounds: Vec<RoundRecord>,
    pub consensus_metrics: PillarScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_synthesis: Option<FinalSynthesis>,
    pub unresolved_concerns: Vec<TeamConcern>,
    pub token_usage: TokenUsage,
}

impl EvaluationReport {
    pub fn final_round(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    /// Every result one agent produced, in round order.
    pub fn history_for(&self, agent_name: &str) -> Vec<&AgentResult> {
        self.rounds
            .iter()
            .filter_map(|r| r.result_for(agent_name))
            .collect()
    }

    /// Mean clarity of the final round (0 when there are no results).
    pub fn final_clarity(&self) -> f64 {
        match self.final_round() {
            Some(round) if !round.results.is_empty() => {
                round.results.iter().map(|r| r.clarity_score).sum::<f64>()
                    / round.results.len() as f64
            }
            _ => 0.0,
        }
    }
}
