//! Expertise-weighted aggregation of final-round scores.

use crate::agent::AgentDefinition;
use crate::evaluation::AgentResult;
use crate::pillar::{Pillar, PillarRegistry, PillarScores, PillarValue};

/// Reduces per-agent scores to one value per pillar
///
/// Each agent's score counts in proportion to its expertise weight for the
/// pillar. Agents with weight 0, or without a numeric value, do not
/// contribute; a pillar with no contributors stays unknown.
#[derive(Debug, Clone, Default)]
pub struct PillarAggregator {
    registry: PillarRegistry,
}

impl PillarAggregator {
    pub fn new(registry: PillarRegistry) -> Self {
        Self { registry }
    }

    pub fn aggregate(&self, results: &[AgentResult], roster: &[AgentDefinition]) -> PillarScores {
        self.registry
            .pillars()
            .iter()
            .map(|pillar| (*pillar, self.aggregate_pillar(*pillar, results, roster)))
            .collect()
    }

    fn aggregate_pillar(
        &self,
        pillar: Pillar,
        results: &[AgentResult],
        roster: &[AgentDefinition],
    ) -> PillarValue {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for result in results {
            let Some(agent) = roster.iter().find(|a| a.name == result.agent_name) else {
                continue;
            };
            let weight = agent.expertise.weight(pillar);
            if weight <= 0.0 {
                continue;
            }
            if let Some(score) = result.metrics.get(pillar).as_score()
                && score.is_finite()
            {
                weighted_sum += weight * score;
                total_weight += weight;
            }
        }

        if total_weight > 0.0 {
            PillarValue::Scored(pillar.rule().clamp(weighted_sum / total_weight))
        } else {
            PillarValue::Unknown
        }
    }

    /// Max minus min of the numeric values for `pillar` (0 with fewer than two).
    pub fn spread(results: &[AgentResult], pillar: Pillar) -> f64 {
        let values: Vec<f64> = results
            .iter()
            .filter_map(|r| r.metrics.get(pillar).as_score())
            .collect();
        if values.len() < 2 {
            return 0.0;
        }
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        max - min
    }
}
