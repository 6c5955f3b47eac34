//! Agent roster from TOML (`[[agents]]` array)

use council_domain::agent::validation::{ConfigIssue, ConfigIssueCode, Severity};
use council_domain::{AgentDefinition, DomainError, ExpertiseProfile, PillarRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One agent entry
///
/// # Example
///
/// ```toml
/// [[agents]]
/// name = "security-reviewer"
/// role = "Security Reviewer"
/// description = "Looks for injection, auth and secrets handling problems."
/// weights = { codeQuality = 0.5, technicalDebtHours = 0.3, testCoverage = 0.2 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentEntry {
    pub name: String,
    pub role: String,
    pub description: String,
    /// Pillar key → weight in 0..=1
    pub weights: BTreeMap<String, f64>,
}

impl FileAgentEntry {
    fn to_definition(&self, registry: &PillarRegistry) -> Result<AgentDefinition, ConfigIssue> {
        if self.weights.is_empty() {
            return Err(ConfigIssue::error(
                ConfigIssueCode::MissingAgentWeights {
                    agent: self.name.clone(),
                },
                format!("agents.{}: no expertise weights configured", self.name),
            ));
        }

        let expertise = ExpertiseProfile::from_named(
            self.weights.iter().map(|(k, w)| (k.as_str(), *w)),
        )
        .map_err(|e| match e {
            DomainError::UnknownPillar(key) => ConfigIssue::error(
                ConfigIssueCode::UnknownPillar {
                    agent: self.name.clone(),
                    key: key.clone(),
                },
                format!(
                    "agents.{}: unknown pillar '{}' (expected one of {})",
                    self.name,
                    key,
                    registry.keys().join(", ")
                ),
            ),
            DomainError::InvalidWeight { pillar, weight } => ConfigIssue::error(
                ConfigIssueCode::InvalidWeight {
                    agent: self.name.clone(),
                    key: pillar.clone(),
                },
                format!(
                    "agents.{}: weight {} for {} is outside 0.0-1.0",
                    self.name, weight, pillar
                ),
            ),
            other => ConfigIssue::error(
                ConfigIssueCode::MissingAgentWeights {
                    agent: self.name.clone(),
                },
                format!("agents.{}: {}", self.name, other),
            ),
        })?;

        let role = if self.role.trim().is_empty() {
            self.name.clone()
        } else {
            self.role.clone()
        };
        Ok(AgentDefinition::new(
            self.name.clone(),
            role,
            self.description.clone(),
            expertise,
        ))
    }
}

/// Build the roster: the configured agents, or the built-in five when none are configured.
pub fn parse_roster(
    entries: &[FileAgentEntry],
    registry: &PillarRegistry,
) -> (Vec<AgentDefinition>, Vec<ConfigIssue>) {
    if entries.is_empty() {
        return (AgentDefinition::default_roster(), vec![]);
    }

    let mut agents = Vec::new();
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for entry in entries {
        if !seen.insert(entry.name.as_str()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicateAgent {
                    agent: entry.name.clone(),
                },
                format!("agents.{}: defined more than once", entry.name),
            ));
            continue;
        }
        match entry.to_definition(registry) {
            Ok(agent) => {
                issues.extend(agent.validate(registry));
                agents.push(agent);
            }
            Err(issue) => issues.push(issue),
        }
    }

    if agents.is_empty() {
        issues.push(ConfigIssue {
            severity: Severity::Error,
            code: ConfigIssueCode::OutOfRange {
                field: "agents".to_string(),
            },
            message: "agents: no usable agent definitions".to_string(),
        });
    }

    (agents, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::Pillar;

    fn entry(name: &str, weights: &[(&str, f64)]) -> FileAgentEntry {
        FileAgentEntry {
            name: name.to_string(),
            role: String::new(),
            description: String::new(),
            weights: weights.iter().map(|(k, w)| (k.to_string(), *w)).collect(),
        }
    }

    #[test]
    fn test_empty_uses_default_roster() {
        let (agents, issues) = parse_roster(&[], &PillarRegistry::standard());
        assert_eq!(agents.len(), 5);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_valid_entry() {
        let (agents, issues) = parse_roster(
            &[entry("security", &[("codeQuality", 0.5), ("testCoverage", 0.2)])],
            &PillarRegistry::standard(),
        );
        assert!(issues.is_empty());
        assert_eq!(agents[0].role, "security");
        assert_eq!(agents[0].expertise.weight(Pillar::CodeQuality), 0.5);
    }

    #[test]
    fn test_invalid_entries_are_errors() {
        let (agents, issues) = parse_roster(
            &[
                entry("no-weights", &[]),
                entry("bad-key", &[("speed", 0.5)]),
                entry("bad-weight", &[("codeQuality", 1.5)]),
            ],
            &PillarRegistry::standard(),
        );
        assert!(agents.is_empty());
        assert!(ConfigIssue::has_errors(&issues));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::UnknownPillar { key, .. } if key == "speed"
        )));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::InvalidWeight { key, .. } if key == "codeQuality"
        )));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::MissingAgentWeights { agent } if agent == "no-weights"
        )));
    }

    #[test]
    fn test_duplicate_and_no_primary() {
        let (agents, issues) = parse_roster(
            &[
                entry("a", &[("codeQuality", 0.2)]),
                entry("a", &[("codeQuality", 0.6)]),
            ],
            &PillarRegistry::standard(),
        );
        assert_eq!(agents.len(), 1);
        assert!(issues.iter().any(|i| i.severity == Severity::Warning));
        assert!(issues
            .iter()
            .any(|i| matches!(i.code, ConfigIssueCode::DuplicateAgent { .. })));
    }
}
