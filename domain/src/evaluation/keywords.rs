//! Justification keyword tables used by the clarity evaluator.

use crate::pillar::Pillar;
use std::collections::BTreeMap;

/// Per-pillar words whose presence in a narrative counts as a justification.
///
/// Matching is a case-insensitive substring scan over summary and details.
/// Tables are plain data; callers may replace the defaults entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct JustificationKeywords {
    table: BTreeMap<Pillar, Vec<String>>,
}

impl JustificationKeywords {
    pub fn new(table: impl IntoIterator<Item = (Pillar, Vec<String>)>) -> Self {
        Self {
            table: table
                .into_iter()
                .map(|(p, words)| (p, words.into_iter().map(|w| w.to_lowercase()).collect()))
                .collect(),
        }
    }

    /// A table with no keywords; nothing counts as justified.
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Replace the keyword list for one pillar.
    pub fn with(mut self, pillar: Pillar, words: &[&str]) -> Self {
        self.table
            .insert(pillar, words.iter().map(|w| w.to_lowercase()).collect());
        self
    }

    pub fn keywords(&self, pillar: Pillar) -> &[String] {
        self.table.get(&pillar).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `text` justifies `pillar`.
    pub fn is_justified(&self, pillar: Pillar, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords(pillar)
            .iter()
            .any(|word| haystack.contains(word.as_str()))
    }
}

impl Default for JustificationKeywords {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        Self::new([
            (
                Pillar::FunctionalImpact,
                words(&["user", "feature", "behavior", "behaviour", "impact", "functionality", "customer"]),
            ),
            (
                Pillar::IdealTimeHours,
                words(&["estimate", "should take", "ideal", "hours", "effort", "competent"]),
            ),
            (
                Pillar::TestCoverage,
                words(&["test", "coverage", "assert", "spec", "untested"]),
            ),
            (
                Pillar::CodeQuality,
                words(&["readab", "naming", "maintainab", "idiomatic", "clean", "duplicat", "style"]),
            ),
            (
                Pillar::CodeComplexity,
                words(&["complex", "simple", "cognitive", "nesting", "branch", "coupling"]),
            ),
            (
                Pillar::ActualTimeHours,
                words(&["spent", "took", "actual", "hours", "iteration", "commit history"]),
            ),
            (
                Pillar::TechnicalDebtHours,
                words(&["debt", "shortcut", "workaround", "hack", "todo", "refactor"]),
            ),
            (
                Pillar::DebtReductionHours,
                words(&["debt", "cleanup", "clean up", "remove", "simplif", "refactor"]),
            ),
        ])
    }
}
