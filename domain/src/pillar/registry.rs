//! Pillar registry: the scored dimensions of a code change and their validity rules.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A scored dimension of a code change
///
/// Variant order is the canonical pillar order used for maps and output.
///
/// # Example
///
/// ```
/// use council_domain::pillar::Pillar;
///
/// let pillar: Pillar = "codeQuality".parse().unwrap();
/// assert_eq!(pillar, Pillar::CodeQuality);
/// assert_eq!(pillar.key(), "codeQuality");
/// assert!(!pillar.rule().nullable);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pillar {
    FunctionalImpact,
    IdealTimeHours,
    TestCoverage,
    CodeQuality,
    CodeComplexity,
    ActualTimeHours,
    TechnicalDebtHours,
    DebtReductionHours,
}

impl Pillar {
    /// The seven pillars every evaluation scores.
    pub const CORE: [Pillar; 7] = [
        Pillar::FunctionalImpact,
        Pillar::IdealTimeHours,
        Pillar::TestCoverage,
        Pillar::CodeQuality,
        Pillar::CodeComplexity,
        Pillar::ActualTimeHours,
        Pillar::TechnicalDebtHours,
    ];

    /// Wire key (camelCase) used in generated JSON.
    pub fn key(&self) -> &'static str {
        match self {
            Pillar::FunctionalImpact => "functionalImpact",
            Pillar::IdealTimeHours => "idealTimeHours",
            Pillar::TestCoverage => "testCoverage",
            Pillar::CodeQuality => "codeQuality",
            Pillar::CodeComplexity => "codeComplexity",
            Pillar::ActualTimeHours => "actualTimeHours",
            Pillar::TechnicalDebtHours => "technicalDebtHours",
            Pillar::DebtReductionHours => "debtReductionHours",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Pillar::FunctionalImpact => "Functional Impact",
            Pillar::IdealTimeHours => "Ideal Time (hours)",
            Pillar::TestCoverage => "Test Coverage",
            Pillar::CodeQuality => "Code Quality",
            Pillar::CodeComplexity => "Code Complexity",
            Pillar::ActualTimeHours => "Actual Time (hours)",
            Pillar::TechnicalDebtHours => "Technical Debt (hours)",
            Pillar::DebtReductionHours => "Debt Reduction (hours)",
        }
    }

    /// Validity rule for values of this pillar.
    pub fn rule(&self) -> PillarRule {
        match self {
            Pillar::FunctionalImpact
            | Pillar::TestCoverage
            | Pillar::CodeQuality
            | Pillar::CodeComplexity => PillarRule::score(1.0, 10.0),
            Pillar::IdealTimeHours | Pillar::ActualTimeHours | Pillar::DebtReductionHours => {
                PillarRule::hours()
            }
            Pillar::TechnicalDebtHours => PillarRule::signed_hours(),
        }
    }
}

impl std::fmt::Display for Pillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Pillar {
    type Err = DomainError;

    /// Accepts the camelCase wire key or its snake_case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        [
            Pillar::FunctionalImpact,
            Pillar::IdealTimeHours,
            Pillar::TestCoverage,
            Pillar::CodeQuality,
            Pillar::CodeComplexity,
            Pillar::ActualTimeHours,
            Pillar::TechnicalDebtHours,
            Pillar::DebtReductionHours,
        ]
        .into_iter()
        .find(|p| p.key().to_lowercase() == folded)
        .ok_or_else(|| DomainError::UnknownPillar(s.to_string()))
    }
}

/// Sign constraint on a pillar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Strictly positive scores (1-10 scales)
    Positive,
    /// Zero or more (durations)
    NonNegative,
    /// Any sign; negative technical debt means debt was paid down
    Signed,
}

/// Validity rule for one pillar: range, sign and nullability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PillarRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sign: Sign,
    /// Whether an explicit "unknown" is an acceptable answer
    pub nullable: bool,
}

impl PillarRule {
    fn score(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            sign: Sign::Positive,
            nullable: false,
        }
    }

    fn hours() -> Self {
        Self {
            min: Some(0.0),
            max: None,
            sign: Sign::NonNegative,
            nullable: true,
        }
    }

    fn signed_hours() -> Self {
        Self {
            min: None,
            max: None,
            sign: Sign::Signed,
            nullable: true,
        }
    }

    /// Whether `value` satisfies this rule.
    pub fn is_valid(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let sign_ok = match self.sign {
            Sign::Positive => value > 0.0,
            Sign::NonNegative => value >= 0.0,
            Sign::Signed => true,
        };
        sign_ok
            && self.min.is_none_or(|min| value >= min)
            && self.max.is_none_or(|max| value <= max)
    }

    /// Clamp `value` into the rule's range.
    pub fn clamp(&self, value: f64) -> f64 {
        let mut v = value;
        if let Some(min) = self.min {
            v = v.max(min);
        }
        if let Some(max) = self.max {
            v = v.min(max);
        }
        if self.sign == Sign::NonNegative {
            v = v.max(0.0);
        }
        v
    }

    /// Human-readable range, e.g. "1-10" or ">= 0".
    pub fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("{}-{}", min, max),
            (Some(min), None) => format!(">= {}", min),
            (None, Some(max)) => format!("<= {}", max),
            (None, None) => "any number".to_string(),
        }
    }
}

/// The ordered set of pillars an evaluation scores.
///
/// Seven pillars by default; the debt-reduction pillar can be enabled as an
/// eighth. Every interpreted metric map carries exactly these keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PillarRegistry {
    pillars: Vec<Pillar>,
}

impl PillarRegistry {
    /// The seven core pillars.
    pub fn standard() -> Self {
        Self {
            pillars: Pillar::CORE.to_vec(),
        }
    }

    /// The seven core pillars plus `debtReductionHours`.
    pub fn with_debt_reduction() -> Self {
        let mut pillars = Pillar::CORE.to_vec();
        pillars.push(Pillar::DebtReductionHours);
        Self { pillars }
    }

    pub fn pillars(&self) -> &[Pillar] {
        &self.pillars
    }

    pub fn contains(&self, pillar: Pillar) -> bool {
        self.pillars.contains(&pillar)
    }

    pub fn len(&self) -> usize {
        self.pillars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pillars.is_empty()
    }

    /// Wire keys in canonical order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.pillars.iter().map(|p| p.key()).collect()
    }
}

impl Default for PillarRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
