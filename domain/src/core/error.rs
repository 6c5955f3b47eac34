//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Only configuration-class problems surface as errors. Malformed backend
/// output and invalid pillar values are recovered locally and never reach
/// this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid expertise weight for {pillar}: {weight} (expected 0.0..=1.0)")]
    InvalidWeight { pillar: String, weight: f64 },

    #[error("Unknown pillar: {0}")]
    UnknownPillar(String),

    #[error("Unknown depth mode: {0} (expected fast, normal or deep)")]
    UnknownDepthMode(String),

    #[error("No agents configured")]
    NoAgents,

    #[error("Invalid change: {0}")]
    InvalidChange(String),
}

impl DomainError {
    /// Whether this error stems from missing or broken configuration.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, DomainError::InvalidChange(_))
    }
}
