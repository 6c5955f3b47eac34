//! Concern bookkeeping across rounds.
//!
//! Acknowledgements are advisory: an agent claiming a concern was addressed
//! marks it resolved, nothing verifies the claim.

use super::context::TeamConcern;
use crate::core::string::normalize_statement;
use crate::evaluation::AgentResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One acknowledgement of a ledger concern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    pub by_agent: String,
    pub round: usize,
    pub addressed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct LedgerEntry {
    concern: TeamConcern,
    key: (String, String),
    acknowledgements: Vec<Acknowledgement>,
}

impl LedgerEntry {
    fn is_resolved(&self) -> bool {
        self.acknowledgements.iter().any(|a| a.addressed)
    }
}

/// Every concern raised during an evaluation and its acknowledgements
#[derive(Debug, Clone, Default)]
pub struct ConcernLedger {
    entries: Vec<LedgerEntry>,
}

fn ledger_key(agent: &str, concern: &str) -> (String, String) {
    (agent.trim().to_lowercase(), normalize_statement(concern))
}

impl ConcernLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished round into the ledger.
    ///
    /// Acknowledgements are matched against concerns from earlier rounds
    /// first; then the round's own concerns are recorded (a repeated
    /// concern from the same agent is not recorded twice).
    pub fn record_round(&mut self, round: usize, results: &[AgentResult]) {
        for result in results {
            for ack in &result.addressed_concerns {
                let key = ledger_key(&ack.from_agent, &ack.concern);
                match self.entries.iter_mut().find(|e| e.key == key) {
                    Some(entry) => entry.acknowledgements.push(Acknowledgement {
                        by_agent: result.agent_name.clone(),
                        round,
                        addressed: ack.addressed,
                        explanation: ack.explanation.clone(),
                    }),
                    None => debug!(
                        "{} acknowledged an unknown concern from {}: {}",
                        result.agent_name, ack.from_agent, ack.concern
                    ),
                }
            }
        }

        for result in results {
            for concern in &result.concerns {
                let key = ledger_key(&result.agent_name, concern);
                if self.entries.iter().any(|e| e.key == key) {
                    continue;
                }
                self.entries.push(LedgerEntry {
                    concern: TeamConcern::new(result.agent_name.clone(), concern.clone(), round),
                    key,
                    acknowledgements: Vec::new(),
                });
            }
        }
    }

    /// Concerns nobody has marked as addressed, in the order raised.
    pub fn open(&self) -> Vec<TeamConcern> {
        self.entries
            .iter()
            .filter(|e| !e.is_resolved())
            .map(|e| e.concern.clone())
            .collect()
    }

    pub fn resolved(&self) -> Vec<TeamConcern> {
        self.entries
            .iter()
            .filter(|e| e.is_resolved())
            .map(|e| e.concern.clone())
            .collect()
    }

    /// Acknowledgements recorded for a concern.
    pub fn acknowledgements(&self, agent: &str, concern: &str) -> &[Acknowledgement] {
        let key = ledger_key(agent, concern);
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.acknowledgements.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
