//! Evaluation configuration from TOML (`[evaluation]` section)

use council_application::EvaluationParams;
use council_domain::agent::validation::{ConfigIssue, ConfigIssueCode, Severity};
use council_domain::{DepthMode, DepthProfiles, PillarRegistry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Raw evaluation configuration from TOML
///
/// # Example
///
/// ```toml
/// [evaluation]
/// depth = "normal"              # "fast", "normal", "deep"
/// rounds = 3                    # initial round + discussion rounds
/// concurrent = true
/// synthesize = true
/// max_output_tokens = 2048
/// timeout_seconds = 120         # 0 disables the per-generation timeout
/// large_diff_threshold = 40000  # bytes; larger diffs go through retrieval
/// retrieval_top_k = 4
/// docs_dir = "docs"             # optional, enables documentation retrieval
/// debt_reduction = false        # score the debtReductionHours pillar too
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEvaluationConfig {
    pub depth: String,
    pub rounds: usize,
    pub concurrent: bool,
    pub synthesize: bool,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
    pub large_diff_threshold: usize,
    pub retrieval_top_k: usize,
    pub docs_dir: Option<PathBuf>,
    pub debt_reduction: bool,
}

impl Default for FileEvaluationConfig {
    fn default() -> Self {
        let params = EvaluationParams::default();
        Self {
            depth: DepthMode::default().as_str().to_string(),
            rounds: params.rounds,
            concurrent: params.concurrent,
            synthesize: params.synthesize,
            max_output_tokens: params.max_output_tokens,
            timeout_seconds: params
                .generation_timeout
                .map(|d| d.as_secs())
                .unwrap_or(0),
            large_diff_threshold: params.large_diff_threshold,
            retrieval_top_k: params.retrieval_top_k,
            docs_dir: None,
            debt_reduction: false,
        }
    }
}

impl FileEvaluationConfig {
    /// Parse the depth mode, falling back to `normal` with a warning.
    pub fn parse_depth(&self) -> (DepthMode, Vec<ConfigIssue>) {
        match self.depth.parse::<DepthMode>() {
            Ok(mode) => (mode, vec![]),
            Err(_) => {
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "evaluation.depth".to_string(),
                        value: self.depth.clone(),
                        valid_values: DepthMode::ALL
                            .iter()
                            .map(|m| m.as_str().to_string())
                            .collect(),
                    },
                    message: format!(
                        "evaluation.depth: unknown value '{}', falling back to 'normal'",
                        self.depth
                    ),
                };
                (DepthMode::Normal, vec![issue])
            }
        }
    }

    /// Pillar registry selected by `debt_reduction`.
    pub fn registry(&self) -> PillarRegistry {
        if self.debt_reduction {
            PillarRegistry::with_debt_reduction()
        } else {
            PillarRegistry::standard()
        }
    }

    /// Convert to run parameters using the (possibly overridden) depth profiles.
    pub fn to_params(&self, profiles: &DepthProfiles) -> (EvaluationParams, Vec<ConfigIssue>) {
        let (mode, mut issues) = self.parse_depth();

        if self.rounds == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::OutOfRange {
                    field: "evaluation.rounds".to_string(),
                },
                message: "evaluation.rounds: must be at least 1, using 1".to_string(),
            });
        }
        if self.max_output_tokens == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::OutOfRange {
                    field: "evaluation.max_output_tokens".to_string(),
                },
                message: "evaluation.max_output_tokens: must be greater than 0".to_string(),
            });
        }

        let timeout = (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds));
        let params = EvaluationParams::default()
            .with_depth(profiles.get(mode))
            .with_rounds(self.rounds)
            .with_concurrent(self.concurrent)
            .with_synthesis(self.synthesize)
            .with_max_output_tokens(self.max_output_tokens)
            .with_generation_timeout(timeout)
            .with_large_diff_threshold(self.large_diff_threshold)
            .with_retrieval(self.retrieval_top_k.max(1), self.docs_dir.is_some());

        (params, issues)
    }
}
