//! Final synthesis: one consolidated view across all rounds.

use super::context::TeamConcern;
use super::report::RoundRecord;
use crate::evaluation::interpreter::parse_json_object;
use crate::pillar::{Pillar, PillarScores};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Consolidated outcome of the discussion
///
/// Produced at most once per evaluation and never refined. Metrics are
/// always the aggregated consensus values; generated text only supplies
/// the narrative. Unresolved concerns are rendered as text and evolution
/// notes are one newline-separated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalSynthesis {
    pub summary: String,
    pub details: String,
    pub metrics: PillarScores,
    pub unresolved_concerns: Vec<String>,
    pub evolution_notes: String,
}

impl FinalSynthesis {
    /// Build from generated text; `None` when the text has no usable summary.
    pub fn from_generation(
        raw: &str,
        consensus: PillarScores,
        unresolved: Vec<TeamConcern>,
        rounds: &[RoundRecord],
    ) -> Option<Self> {
        let object = parse_json_object(raw)?;
        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .to_string();
        let details = object
            .get("details")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let generated_notes = match object
            .get("evolutionNotes")
            .or_else(|| object.get("evolution_notes"))
        {
            Some(Value::String(text)) => text.trim().to_string(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        };
        let evolution_notes = if generated_notes.is_empty() {
            score_evolution(rounds).join("\n")
        } else {
            generated_notes
        };

        Some(Self {
            summary,
            details,
            metrics: consensus,
            unresolved_concerns: render_concerns(&unresolved),
            evolution_notes,
        })
    }

    /// Synthesis assembled without a generation call.
    pub fn deterministic(
        consensus: PillarScores,
        unresolved: Vec<TeamConcern>,
        rounds: &[RoundRecord],
    ) -> Self {
        let agents = rounds.last().map(|r| r.results.len()).unwrap_or(0);
        let summary = format!(
            "{} agent(s) converged over {} round(s): {}",
            agents,
            rounds.len(),
            consensus.to_compact_string()
        );

        let mut details = String::new();
        if let Some(last) = rounds.last() {
            for result in &last.results {
                if !result.summary.is_empty() {
                    details.push_str(&format!("{}: {}\n", result.agent_name, result.summary));
                }
            }
        }
        if !unresolved.is_empty() {
            details.push_str(&format!("{} concern(s) remain unresolved.", unresolved.len()));
        }

        Self {
            summary,
            details: details.trim_end().to_string(),
            metrics: consensus,
            unresolved_concerns: render_concerns(&unresolved),
            evolution_notes: score_evolution(rounds).join("\n"),
        }
    }

    /// Evolution notes one per line; empty when scores did not move.
    pub fn evolution_lines(&self) -> impl Iterator<Item = &str> {
        self.evolution_notes.lines().filter(|line| !line.trim().is_empty())
    }
}

fn render_concerns(concerns: &[TeamConcern]) -> Vec<String> {
    concerns.iter().map(TeamConcern::to_string).collect()
}

/// Per-pillar movement of the mean score between the first and last round.
///
/// Pillars whose mean moved by less than 0.05, or that have no numeric
/// values in either round, are omitted.
pub fn score_evolution(rounds: &[RoundRecord]) -> Vec<String> {
    let (Some(first), Some(last)) = (rounds.first(), rounds.last()) else {
        return Vec::new();
    };
    if rounds.len() < 2 {
        return Vec::new();
    }

    let mean = |record: &RoundRecord, pillar: Pillar| {
        let values: Vec<f64> = record
            .results
            .iter()
            .filter_map(|r| r.metrics.get(pillar).as_score())
            .collect();
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };

    let mut pillars: Vec<Pillar> = first
        .results
        .iter()
        .flat_map(|r| r.metrics.pillars())
        .collect();
    pillars.sort();
    pillars.dedup();

    pillars
        .into_iter()
        .filter_map(|pillar| {
            let before = mean(first, pillar)?;
            let after = mean(last, pillar)?;
            ((after - before).abs() >= 0.05).then(|| {
                format!(
                    "{}: {:.1} → {:.1} over {} rounds",
                    pillar.key(),
                    before,
                    after,
                    rounds.len()
                )
            })
        })
        .collect()
}
