//! Depth profile overrides from TOML (`[depth.<mode>]` sections)

use council_domain::agent::validation::{ConfigIssue, ConfigIssueCode, Severity};
use council_domain::{DepthMode, DepthProfile, DepthProfiles};
use serde::{Deserialize, Serialize};

/// Partial override of one depth profile; unset fields keep the built-in value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDepthOverride {
    pub max_iterations: Option<usize>,
    pub clarity_threshold: Option<f64>,
    pub max_self_questions: Option<usize>,
    pub skip_self_refinement: Option<bool>,
    pub token_budget: Option<u64>,
}

impl FileDepthOverride {
    pub fn apply(&self, base: DepthProfile) -> DepthProfile {
        DepthProfile {
            max_iterations: self.max_iterations.unwrap_or(base.max_iterations),
            clarity_threshold: self.clarity_threshold.unwrap_or(base.clarity_threshold),
            max_self_questions: self.max_self_questions.unwrap_or(base.max_self_questions),
            skip_self_refinement: self
                .skip_self_refinement
                .unwrap_or(base.skip_self_refinement),
            token_budget: self.token_budget.unwrap_or(base.token_budget),
        }
    }
}

/// Raw `[depth]` configuration
///
/// # Example
///
/// ```toml
/// [depth.normal]
/// max_iterations = 4
/// clarity_threshold = 85
///
/// [depth.fast]
/// skip_self_refinement = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDepthConfig {
    pub fast: FileDepthOverride,
    pub normal: FileDepthOverride,
    pub deep: FileDepthOverride,
}

impl FileDepthConfig {
    fn entry(&self, mode: DepthMode) -> &FileDepthOverride {
        match mode {
            DepthMode::Fast => &self.fast,
            DepthMode::Normal => &self.normal,
            DepthMode::Deep => &self.deep,
        }
    }

    /// Built-in profiles with overrides applied.
    ///
    /// A threshold outside 0..=100 is ignored with a warning.
    pub fn to_profiles(&self) -> (DepthProfiles, Vec<ConfigIssue>) {
        let mut profiles = DepthProfiles::default();
        let mut issues = Vec::new();

        for mode in DepthMode::ALL {
            let mut entry = self.entry(mode).clone();
            if let Some(threshold) = entry.clarity_threshold
                && !(0.0..=100.0).contains(&threshold)
            {
                issues.push(ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::OutOfRange {
                        field: format!("depth.{}.clarity_threshold", mode.as_str()),
                    },
                    message: format!(
                        "depth.{}.clarity_threshold: {} is outside 0-100, keeping the built-in value",
                        mode.as_str(),
                        threshold
                    ),
                });
                entry.clarity_threshold = None;
            }
            profiles.set(mode, entry.apply(profiles.get(mode)));
        }

        (profiles, issues)
    }
}
