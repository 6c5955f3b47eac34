//! Agent definitions and the built-in evaluation roster.

use super::expertise::ExpertiseProfile;
use super::validation::{ConfigIssue, ConfigIssueCode, Severity};
use crate::core::error::DomainError;
use crate::pillar::{Pillar, PillarRegistry};
use serde::{Deserialize, Serialize};

/// One evaluator on the council
///
/// Every agent scores all pillars; its [`ExpertiseProfile`] decides which
/// ones it is held accountable for. Role-specific behavior lives entirely
/// in this data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Stable identifier, e.g. "qa-engineer"
    pub name: String,
    /// Human-readable role, e.g. "QA Engineer"
    pub role: String,
    /// Perspective the agent argues from (used in prompts)
    pub description: String,
    pub expertise: ExpertiseProfile,
}

impl AgentDefinition {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        description: impl Into<String>,
        expertise: ExpertiseProfile,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            description: description.into(),
            expertise,
        }
    }

    /// Config-level sanity checks for this agent against `registry`.
    pub fn validate(&self, registry: &PillarRegistry) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::EmptyAgentName,
                message: "agent name must not be empty".to_string(),
            });
        }
        if self.expertise.primary_pillars(registry).is_empty() {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::NoPrimaryPillar {
                    agent: self.name.clone(),
                },
                message: format!(
                    "agent '{}' has no primary pillar (weight >= 0.4); its clarity score is driven by secondary pillars only",
                    self.name
                ),
            });
        }
        issues
    }

    /// The five-agent roster used when no custom roster is configured.
    pub fn default_roster() -> Vec<AgentDefinition> {
        // Weights are static and in range, so construction cannot fail.
        let profile = |weights: &[(Pillar, f64)]| {
            ExpertiseProfile::new(weights.iter().copied())
                .unwrap_or_else(|e| unreachable!("built-in profile invalid: {e}"))
        };

        vec![
            AgentDefinition::new(
                "business-analyst",
                "Business Analyst",
                "Judges what the change delivers to users and how long it should take a competent engineer.",
                profile(&[
                    (Pillar::FunctionalImpact, 0.5),
                    (Pillar::IdealTimeHours, 0.45),
                    (Pillar::TestCoverage, 0.05),
                    (Pillar::CodeQuality, 0.05),
                    (Pillar::CodeComplexity, 0.05),
                    (Pillar::ActualTimeHours, 0.15),
                    (Pillar::TechnicalDebtHours, 0.05),
                ]),
            ),
            AgentDefinition::new(
                "developer-author",
                "Developer (Author)",
                "Explains the implementation choices and estimates the time actually spent.",
                profile(&[
                    (Pillar::FunctionalImpact, 0.1),
                    (Pillar::IdealTimeHours, 0.15),
                    (Pillar::TestCoverage, 0.1),
                    (Pillar::CodeQuality, 0.15),
                    (Pillar::CodeComplexity, 0.2),
                    (Pillar::ActualTimeHours, 0.5),
                    (Pillar::TechnicalDebtHours, 0.1),
                ]),
            ),
            AgentDefinition::new(
                "developer-reviewer",
                "Developer (Reviewer)",
                "Reviews readability, correctness and maintainability line by line.",
                profile(&[
                    (Pillar::FunctionalImpact, 0.1),
                    (Pillar::IdealTimeHours, 0.1),
                    (Pillar::TestCoverage, 0.15),
                    (Pillar::CodeQuality, 0.45),
                    (Pillar::CodeComplexity, 0.25),
                    (Pillar::ActualTimeHours, 0.05),
                    (Pillar::TechnicalDebtHours, 0.15),
                    (Pillar::DebtReductionHours, 0.1),
                ]),
            ),
            AgentDefinition::new(
                "senior-architect",
                "Senior Architect",
                "Weighs structural complexity and the long-term debt the change adds or removes.",
                profile(&[
                    (Pillar::FunctionalImpact, 0.1),
                    (Pillar::IdealTimeHours, 0.1),
                    (Pillar::TestCoverage, 0.05),
                    (Pillar::CodeQuality, 0.2),
                    (Pillar::CodeComplexity, 0.45),
                    (Pillar::ActualTimeHours, 0.05),
                    (Pillar::TechnicalDebtHours, 0.45),
                    (Pillar::DebtReductionHours, 0.3),
                ]),
            ),
            AgentDefinition::new(
                "qa-engineer",
                "QA Engineer",
                "Assesses how well the change is tested and where it is likely to break.",
                profile(&[
                    (Pillar::FunctionalImpact, 0.2),
                    (Pillar::IdealTimeHours, 0.05),
                    (Pillar::TestCoverage, 0.5),
                    (Pillar::CodeQuality, 0.2),
                    (Pillar::CodeComplexity, 0.1),
                    (Pillar::ActualTimeHours, 0.05),
                    (Pillar::TechnicalDebtHours, 0.1),
                ]),
            ),
        ]
    }

    /// Keep only the agents named in `names` (all agents when `names` is empty).
    pub fn filter_roster(
        roster: Vec<AgentDefinition>,
        names: &[String],
    ) -> Result<Vec<AgentDefinition>, DomainError> {
        if names.is_empty() {
            return Ok(roster);
        }
        let selected: Vec<_> = roster
            .into_iter()
            .filter(|a| names.iter().any(|n| n.eq_ignore_ascii_case(&a.name)))
            .collect();
        if selected.is_empty() {
            return Err(DomainError::NoAgents);
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_covers_every_core_pillar() {
        let roster = AgentDefinition::default_roster();
        let registry = PillarRegistry::standard();
        assert_eq!(roster.len(), 5);

        for pillar in Pillar::CORE {
            assert!(
                roster
                    .iter()
                    .any(|a| a.expertise.primary_pillars(&registry).contains(&pillar)),
                "no agent owns {}",
                pillar
            );
        }
    }

    #[test]
    fn test_default_roster_is_valid() {
        let registry = PillarRegistry::standard();
        for agent in AgentDefinition::default_roster() {
            assert!(agent.validate(&registry).is_empty(), "{}", agent.name);
        }
    }

    #[test]
    fn test_agent_without_primary_pillar_warns() {
        let agent = AgentDefinition::new(
            "generalist",
            "Generalist",
            "",
            ExpertiseProfile::new([(Pillar::CodeQuality, 0.2)]).unwrap(),
        );
        let issues = agent.validate(&PillarRegistry::standard());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_filter_roster() {
        let roster = AgentDefinition::default_roster();
        let filtered = AgentDefinition::filter_roster(
            roster.clone(),
            &["QA-Engineer".to_string(), "senior-architect".to_string()],
        )
        .unwrap();
        assert_eq!(filtered.len(), 2);

        let all = AgentDefinition::filter_roster(roster.clone(), &[]).unwrap();
        assert_eq!(all.len(), 5);

        let none = AgentDefinition::filter_roster(roster, &["nobody".to_string()]);
        assert_eq!(none.unwrap_err(), DomainError::NoAgents);
    }
}
