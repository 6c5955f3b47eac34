//! Self-question templates: gap category → follow-up question.

use crate::evaluation::{Gap, GapKind};
use std::collections::BTreeMap;

/// Maps gap categories to follow-up question templates.
///
/// `{pillar}` in a template is replaced with the pillar's display name and
/// `{range}` with its valid range. A gap whose kind has no template yields
/// no question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionTemplates {
    templates: BTreeMap<GapKind, String>,
}

impl QuestionTemplates {
    pub fn new(templates: impl IntoIterator<Item = (GapKind, String)>) -> Self {
        Self {
            templates: templates.into_iter().collect(),
        }
    }

    /// A table without templates; every gap is unanswerable.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    pub fn with(mut self, kind: GapKind, template: impl Into<String>) -> Self {
        self.templates.insert(kind, template.into());
        self
    }

    /// The question for one gap, if its category is mapped.
    pub fn question_for(&self, gap: &Gap) -> Option<String> {
        self.templates.get(&gap.kind).map(|template| {
            template
                .replace("{pillar}", gap.pillar.display_name())
                .replace("{range}", &gap.pillar.rule().describe())
        })
    }

    /// Up to `limit` questions for `gaps`, most severe first, without duplicates.
    pub fn questions(&self, gaps: &[Gap], limit: usize) -> Vec<String> {
        let mut ordered: Vec<&Gap> = gaps.iter().collect();
        ordered.sort_by_key(|g| g.severity);

        let mut questions: Vec<String> = Vec::new();
        for gap in ordered {
            if questions.len() >= limit {
                break;
            }
            if let Some(question) = self.question_for(gap)
                && !questions.contains(&question)
            {
                questions.push(question);
            }
        }
        questions
    }
}

impl Default for QuestionTemplates {
    fn default() -> Self {
        Self::empty()
            .with(
                GapKind::MissingMetric,
                "What is your score for {pillar} ({range})? Provide a number, or null with an explanation if it cannot be determined.",
            )
            .with(
                GapKind::UnjustifiedNull,
                "Why can {pillar} not be determined from this change? Explain what information is missing.",
            )
            .with(
                GapKind::NullNotAllowed,
                "{pillar} must always be scored ({range}). What score do you assign and why?",
            )
            .with(
                GapKind::WeakRationale,
                "What specific evidence in the change supports your {pillar} score?",
            )
            .with(
                GapKind::OutOfRange,
                "Your {pillar} value is outside the valid range ({range}). What is the corrected score?",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::GapSeverity;
    use crate::pillar::Pillar;

    #[test]
    fn test_placeholders_are_filled() {
        let templates = QuestionTemplates::default();
        let gap = Gap::new(GapKind::OutOfRange, Pillar::CodeQuality, GapSeverity::Major);
        let question = templates.question_for(&gap).unwrap();
        assert!(question.contains("Code Quality"));
        assert!(question.contains("1-10"));
    }

    #[test]
    fn test_questions_ordered_by_severity_and_limited() {
        let templates = QuestionTemplates::default();
        let gaps = vec![
            Gap::new(GapKind::WeakRationale, Pillar::TestCoverage, GapSeverity::Minor),
            Gap::new(GapKind::MissingMetric, Pillar::FunctionalImpact, GapSeverity::Critical),
            Gap::new(GapKind::WeakRationale, Pillar::CodeQuality, GapSeverity::Major),
        ];
        let questions = templates.questions(&gaps, 2);
        assert_eq!(questions.len(), 2);
        assert!(questions[0].contains("Functional Impact"));
        assert!(questions[1].contains("Code Quality"));
    }

    #[test]
    fn test_unmapped_gap_yields_no_question() {
        let templates = QuestionTemplates::empty().with(GapKind::MissingMetric, "{pillar}?");
        let gaps = vec![Gap::new(
            GapKind::WeakRationale,
            Pillar::CodeQuality,
            GapSeverity::Major,
        )];
        assert!(templates.questions(&gaps, 3).is_empty());
    }
}
