//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod agent;
mod depth;
mod evaluation;
mod logging;
mod output;
mod provider;

pub use agent::{FileAgentEntry, parse_roster};
pub use depth::{FileDepthConfig, FileDepthOverride};
pub use evaluation::FileEvaluationConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use provider::{FileProviderConfig, FileProviderKind};

use council_application::EvaluationParams;
use council_domain::AgentDefinition;
use council_domain::agent::validation::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Council run settings
    pub evaluation: FileEvaluationConfig,
    /// Per-mode depth profile overrides
    pub depth: FileDepthConfig,
    /// Generation backend
    pub provider: FileProviderConfig,
    /// Agent roster; empty means the built-in roster
    pub agents: Vec<FileAgentEntry>,
    /// Output settings
    pub output: FileOutputConfig,
    /// Transcript settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Run parameters with depth overrides applied.
    pub fn evaluation_params(&self) -> (EvaluationParams, Vec<ConfigIssue>) {
        let (profiles, mut issues) = self.depth.to_profiles();
        let (params, more) = self.evaluation.to_params(&profiles);
        issues.extend(more);
        (params, issues)
    }

    /// Agent roster for the configured pillar registry.
    pub fn roster(&self) -> (Vec<AgentDefinition>, Vec<ConfigIssue>) {
        parse_roster(&self.agents, &self.evaluation.registry())
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Evaluation parameters (depth mode, rounds, token cap)
    /// 2. Depth profile overrides
    /// 3. The agent roster (weights, pillar names, duplicates)
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.evaluation_params().1;
        issues.extend(self.roster().1);
        issues
    }
}
