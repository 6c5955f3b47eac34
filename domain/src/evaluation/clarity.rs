//! Clarity evaluation: how complete and justified is one agent's result?
//!
//! The score is a weighted sum of per-band confidences (PRIMARY 60%,
//! SECONDARY 30%, TERTIARY 10%), where each band's confidence is the mean
//! of its pillars' confidences. Each shortfall is reported as a [`Gap`]
//! whose message is deterministic, so loops can deduplicate by string.

use super::keywords::JustificationKeywords;
use super::result::AgentResult;
use crate::agent::{ExpertiseBand, ExpertiseProfile};
use crate::pillar::{Pillar, PillarRegistry, PillarValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of an identified shortfall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// No usable value was produced
    MissingMetric,
    /// Explicit null without an explanation
    UnjustifiedNull,
    /// Null on a pillar that must always be scored
    NullNotAllowed,
    /// Numeric value without a supporting rationale
    WeakRationale,
    /// Numeric value violating the pillar's range or sign
    OutOfRange,
}

impl GapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapKind::MissingMetric => "missing metric",
            GapKind::UnjustifiedNull => "null value needs justification",
            GapKind::NullNotAllowed => "null not allowed",
            GapKind::WeakRationale => "needs detailed rationale",
            GapKind::OutOfRange => "value out of range",
        }
    }
}

/// How badly a gap hurts the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    Critical,
    Major,
    Minor,
}

impl GapSeverity {
    /// Severity of a missing or unjustified value in `band`.
    pub fn for_band(band: ExpertiseBand) -> Self {
        match band {
            ExpertiseBand::Primary => GapSeverity::Critical,
            ExpertiseBand::Secondary => GapSeverity::Major,
            ExpertiseBand::Tertiary => GapSeverity::Minor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GapSeverity::Critical => "critical",
            GapSeverity::Major => "major",
            GapSeverity::Minor => "minor",
        }
    }
}

/// One identified shortfall in an agent's result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gap {
    pub kind: GapKind,
    pub pillar: Pillar,
    pub severity: GapSeverity,
    /// Deterministic rendering, e.g. `[critical] functionalImpact: missing metric`
    pub message: String,
}

impl Gap {
    pub fn new(kind: GapKind, pillar: Pillar, severity: GapSeverity) -> Self {
        let message = format!("[{}] {}: {}", severity.as_str(), pillar.key(), kind.as_str());
        Self {
            kind,
            pillar,
            severity,
            message,
        }
    }
}

impl std::fmt::Display for Gap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Tunable constants of the clarity evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarityThresholds {
    /// Details length (chars) that earns partial credit for an unjustified number
    pub detail_min_chars: usize,
    /// Summary must be longer than this for the completeness bonus
    pub bonus_summary_chars: usize,
    /// Details must be longer than this for the completeness bonus
    pub bonus_details_chars: usize,
    pub bonus: f64,
}

impl Default for ClarityThresholds {
    fn default() -> Self {
        Self {
            detail_min_chars: 100,
            bonus_summary_chars: 50,
            bonus_details_chars: 200,
            bonus: 5.0,
        }
    }
}

/// Output of one clarity evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct ClarityReport {
    /// 0..=100
    pub score: f64,
    pub gaps: Vec<Gap>,
    pub band_confidence: BTreeMap<ExpertiseBand, f64>,
}

impl ClarityReport {
    pub fn gap_messages(&self) -> Vec<String> {
        self.gaps.iter().map(|g| g.message.clone()).collect()
    }

    pub fn band(&self, band: ExpertiseBand) -> f64 {
        self.band_confidence.get(&band).copied().unwrap_or(100.0)
    }
}

const ABSENT_CONFIDENCE: f64 = 0.0;
const JUSTIFIED_NULL_CONFIDENCE: f64 = 70.0;
const UNJUSTIFIED_NULL_CONFIDENCE: f64 = 30.0;
const JUSTIFIED_SCORE_CONFIDENCE: f64 = 100.0;
const DETAILED_SCORE_CONFIDENCE: f64 = 70.0;
const BARE_SCORE_CONFIDENCE: f64 = 50.0;
const OUT_OF_RANGE_CAP: f64 = 50.0;

/// Scores the clarity of an [`AgentResult`] against an [`ExpertiseProfile`]
///
/// Pure: the same inputs always produce the same report.
#[derive(Debug, Clone, Default)]
pub struct ClarityEvaluator {
    registry: PillarRegistry,
    keywords: JustificationKeywords,
    thresholds: ClarityThresholds,
}

impl ClarityEvaluator {
    pub fn new(
        registry: PillarRegistry,
        keywords: JustificationKeywords,
        thresholds: ClarityThresholds,
    ) -> Self {
        Self {
            registry,
            keywords,
            thresholds,
        }
    }

    pub fn registry(&self) -> &PillarRegistry {
        &self.registry
    }

    pub fn keywords(&self) -> &JustificationKeywords {
        &self.keywords
    }

    pub fn evaluate(&self, result: &AgentResult, profile: &ExpertiseProfile) -> ClarityReport {
        let narrative = result.narrative();
        let detailed = result.details.chars().count() >= self.thresholds.detail_min_chars;

        let mut gaps = Vec::new();
        let mut per_band: BTreeMap<ExpertiseBand, Vec<f64>> = BTreeMap::new();

        for pillar in self.registry.pillars() {
            let band = profile.band(*pillar);
            let confidence = self.pillar_confidence(
                *pillar,
                band,
                result.metrics.get(*pillar),
                &narrative,
                detailed,
                &mut gaps,
            );
            per_band.entry(band).or_default().push(confidence);
        }

        let band_confidence: BTreeMap<ExpertiseBand, f64> = ExpertiseBand::ALL
            .iter()
            .map(|band| {
                let confidence = match per_band.get(band) {
                    Some(values) if !values.is_empty() => {
                        values.iter().sum::<f64>() / values.len() as f64
                    }
                    _ => 100.0,
                };
                (*band, confidence)
            })
            .collect();

        let mut score: f64 = band_confidence
            .iter()
            .map(|(band, confidence)| band.clarity_share() * confidence)
            .sum();
        if result.summary.chars().count() > self.thresholds.bonus_summary_chars
            && result.details.chars().count() > self.thresholds.bonus_details_chars
        {
            score += self.thresholds.bonus;
        }

        ClarityReport {
            score: score.clamp(0.0, 100.0),
            gaps,
            band_confidence,
        }
    }

    fn pillar_confidence(
        &self,
        pillar: Pillar,
        band: ExpertiseBand,
        value: PillarValue,
        narrative: &str,
        detailed: bool,
        gaps: &mut Vec<Gap>,
    ) -> f64 {
        let rule = pillar.rule();
        let justified = self.keywords.is_justified(pillar, narrative);

        match value {
            PillarValue::Absent => {
                gaps.push(Gap::new(
                    GapKind::MissingMetric,
                    pillar,
                    GapSeverity::for_band(band),
                ));
                ABSENT_CONFIDENCE
            }
            PillarValue::Unknown if !rule.nullable => {
                gaps.push(Gap::new(
                    GapKind::NullNotAllowed,
                    pillar,
                    GapSeverity::Critical,
                ));
                UNJUSTIFIED_NULL_CONFIDENCE
            }
            PillarValue::Unknown if justified => JUSTIFIED_NULL_CONFIDENCE,
            PillarValue::Unknown => {
                gaps.push(Gap::new(
                    GapKind::UnjustifiedNull,
                    pillar,
                    GapSeverity::for_band(band),
                ));
                UNJUSTIFIED_NULL_CONFIDENCE
            }
            PillarValue::Scored(score) => {
                let mut confidence = if justified {
                    JUSTIFIED_SCORE_CONFIDENCE
                } else {
                    let severity = match band {
                        ExpertiseBand::Primary => GapSeverity::Major,
                        _ => GapSeverity::Minor,
                    };
                    gaps.push(Gap::new(GapKind::WeakRationale, pillar, severity));
                    if detailed {
                        DETAILED_SCORE_CONFIDENCE
                    } else {
                        BARE_SCORE_CONFIDENCE
                    }
                };
                if !rule.is_valid(score) {
                    gaps.push(Gap::new(GapKind::OutOfRange, pillar, GapSeverity::Major));
                    confidence = confidence.min(OUT_OF_RANGE_CAP);
                }
                confidence
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pillar::PillarScores;

    fn evaluator() -> ClarityEvaluator {
        ClarityEvaluator::default()
    }

    fn single_primary_profile() -> ExpertiseProfile {
        ExpertiseProfile::new(Pillar::CORE.iter().map(|p| {
            if *p == Pillar::FunctionalImpact {
                (*p, 0.5)
            } else {
                (*p, 0.08)
            }
        }))
        .unwrap()
    }

    fn all_scored(value: f64) -> PillarScores {
        Pillar::CORE
            .iter()
            .map(|p| (*p, PillarValue::Scored(value)))
            .collect()
    }

    // ==================== Scoring Tests ====================

    #[test]
    fn test_unjustified_numbers_stay_below_normal_threshold() {
        let result = AgentResult::new("ok", "", all_scored(5.0));
        let report = evaluator().evaluate(&result, &single_primary_profile());

        let primary = report.band(ExpertiseBand::Primary);
        assert!((50.0..=70.0).contains(&primary), "primary {}", primary);
        assert_eq!(report.band(ExpertiseBand::Secondary), 100.0);
        assert!((report.score - 65.0).abs() < 1e-9);
        assert!(report.score < 80.0);
        assert_eq!(report.gaps.len(), 7);
        assert!(report.gaps.iter().all(|g| g.kind == GapKind::WeakRationale));
    }

    #[test]
    fn test_detailed_rationale_earns_partial_credit() {
        let details = "z".repeat(120);
        let result = AgentResult::new("ok", details, all_scored(5.0));
        let report = evaluator().evaluate(&result, &single_primary_profile());
        assert_eq!(report.band(ExpertiseBand::Primary), 70.0);
    }

    #[test]
    fn test_fully_justified_result_gets_bonus_and_clamps() {
        let summary = "The change adds a user-facing export feature with tests and clean naming.";
        let details = format!(
            "Behavior for the user is improved. Estimate: 3 hours of effort. Tests cover the parser. \
             Readability is good. Complexity is low, simple branches. Spent about 4 hours. \
             No new debt introduced. {}",
            "Padding text. ".repeat(10)
        );
        let result = AgentResult::new(summary, details, all_scored(5.0));
        let report = evaluator().evaluate(&result, &single_primary_profile());

        assert!(report.gaps.is_empty(), "{:?}", report.gap_messages());
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn test_absent_primary_is_critical() {
        let result = AgentResult::new("ok", "", PillarScores::absent(&PillarRegistry::standard()));
        let report = evaluator().evaluate(&result, &single_primary_profile());

        assert_eq!(report.score, 30.0);
        let primary_gap = report
            .gaps
            .iter()
            .find(|g| g.pillar == Pillar::FunctionalImpact)
            .unwrap();
        assert_eq!(primary_gap.severity, GapSeverity::Critical);
        assert_eq!(
            primary_gap.message,
            "[critical] functionalImpact: missing metric"
        );
    }

    #[test]
    fn test_null_handling() {
        let metrics = all_scored(5.0)
            .with(Pillar::ActualTimeHours, PillarValue::Unknown)
            .with(Pillar::CodeQuality, PillarValue::Unknown);
        let result = AgentResult::new("ok", "", metrics);
        let report = evaluator().evaluate(&result, &single_primary_profile());

        let kinds: Vec<(Pillar, GapKind)> = report.gaps.iter().map(|g| (g.pillar, g.kind)).collect();
        assert!(kinds.contains(&(Pillar::ActualTimeHours, GapKind::UnjustifiedNull)));
        assert!(kinds.contains(&(Pillar::CodeQuality, GapKind::NullNotAllowed)));

        // Justification keyword accepted for a nullable pillar only
        let justified = AgentResult::new(
            "ok",
            "The actual time spent cannot be determined; readability is fine.",
            all_scored(5.0)
                .with(Pillar::ActualTimeHours, PillarValue::Unknown)
                .with(Pillar::CodeQuality, PillarValue::Unknown),
        );
        let report = evaluator().evaluate(&justified, &single_primary_profile());
        assert!(!report.gaps.iter().any(|g| g.pillar == Pillar::ActualTimeHours));
        assert!(report
            .gaps
            .iter()
            .any(|g| g.pillar == Pillar::CodeQuality && g.kind == GapKind::NullNotAllowed));
    }

    #[test]
    fn test_out_of_range_caps_confidence() {
        let result = AgentResult::new(
            "ok",
            "user feature impact",
            all_scored(5.0).with(Pillar::FunctionalImpact, PillarValue::Scored(42.0)),
        );
        let report = evaluator().evaluate(&result, &single_primary_profile());
        assert_eq!(report.band(ExpertiseBand::Primary), 50.0);
        assert!(report
            .gaps
            .iter()
            .any(|g| g.kind == GapKind::OutOfRange && g.pillar == Pillar::FunctionalImpact));
    }

    #[test]
    fn test_empty_bands_do_not_penalize() {
        let profile = ExpertiseProfile::new([(Pillar::CodeQuality, 1.0)]).unwrap();
        let result = AgentResult::new("ok", "", PillarScores::absent(&PillarRegistry::standard()));
        let report = evaluator().evaluate(&result, &profile);
        // Primary 0, secondary empty (100), tertiary 0
        assert_eq!(report.score, 30.0);
    }

    // ==================== Purity Tests ====================

    #[test]
    fn test_evaluation_is_idempotent() {
        let result = AgentResult::new(
            "A reasonably sized summary",
            "Tests were added.",
            all_scored(7.0).with(Pillar::TechnicalDebtHours, PillarValue::Unknown),
        );
        let profile = single_primary_profile();
        let e = evaluator();
        let first = e.evaluate(&result, &profile);
        let second = e.evaluate(&result, &profile);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_keywords_are_injected() {
        let e = ClarityEvaluator::new(
            PillarRegistry::standard(),
            JustificationKeywords::empty().with(Pillar::FunctionalImpact, &["ok"]),
            ClarityThresholds::default(),
        );
        let result = AgentResult::new("ok", "", all_scored(5.0));
        let report = e.evaluate(&result, &single_primary_profile());
        assert_eq!(report.band(ExpertiseBand::Primary), 100.0);        assert_eq!(
            e.keywords().keywords(Pillar::FunctionalImpact).to_vec(),
            vec!["ok".to_string()]
        );
    }
}
