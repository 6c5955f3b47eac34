//! Configuration issues detected while validating an evaluation setup.
//!
//! Validation never aborts by itself: callers collect [`ConfigIssue`]s and
//! decide. Issues with [`Severity::Error`] are fatal for an evaluation run.
//!
//! # Examples
//!
//! ```
//! use council_domain::agent::validation::{ConfigIssue, Severity};
//!
//! let issues: Vec<ConfigIssue> = Vec::new();
//! assert!(!ConfigIssue::has_errors(&issues));
//! ```

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// An agent has an empty name.
    EmptyAgentName,
    /// An agent has no weights at all.
    MissingAgentWeights { agent: String },
    /// An agent weight names a pillar that does not exist.
    UnknownPillar { agent: String, key: String },
    /// An agent weight is outside `[0, 1]`.
    InvalidWeight { agent: String, key: String },
    /// An agent has no PRIMARY pillar.
    NoPrimaryPillar { agent: String },
    /// Two agents share a name.
    DuplicateAgent { agent: String },
    /// An enum-like string field holds an unrecognized value.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A numeric field is outside its usable range.
    OutOfRange { field: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Check whether any issues are errors (i.e. fatal).
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors() {
        let warning = ConfigIssue::warning(
            ConfigIssueCode::NoPrimaryPillar {
                agent: "a".to_string(),
            },
            "no primary",
        );
        assert!(!ConfigIssue::has_errors(std::slice::from_ref(&warning)));

        let error = ConfigIssue::error(ConfigIssueCode::EmptyAgentName, "empty");
        assert!(ConfigIssue::has_errors(&[warning, error]));
    }

    #[test]
    fn test_display() {
        let issue = ConfigIssue::error(ConfigIssueCode::EmptyAgentName, "agent name is empty");
        assert_eq!(issue.to_string(), "error: agent name is empty");
    }
}
