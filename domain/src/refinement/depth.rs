//! Depth modes: named bundles of refinement policy.
//!
//! The refinement loop only ever sees a [`DepthProfile`]; it never looks at
//! the mode name.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Named refinement effort level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthMode {
    Fast,
    #[default]
    Normal,
    Deep,
}

impl DepthMode {
    pub const ALL: [DepthMode; 3] = [DepthMode::Fast, DepthMode::Normal, DepthMode::Deep];

    pub fn as_str(&self) -> &'static str {
        match self {
            DepthMode::Fast => "fast",
            DepthMode::Normal => "normal",
            DepthMode::Deep => "deep",
        }
    }

    /// Parse `name`, falling back to `normal` with a warning.
    pub fn resolve(name: &str) -> DepthMode {
        name.parse().unwrap_or_else(|e| {
            warn!("{}; using normal", e);
            DepthMode::Normal
        })
    }
}

impl fmt::Display for DepthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DepthMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" | "f" => Ok(DepthMode::Fast),
            "normal" | "n" => Ok(DepthMode::Normal),
            "deep" | "d" => Ok(DepthMode::Deep),
            _ => Err(DomainError::UnknownDepthMode(s.to_string())),
        }
    }
}

/// Refinement policy parameters for one loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthProfile {
    /// Refinement cycles allowed after the initial generation
    pub max_iterations: usize,
    /// Clarity score (0-100) at which the loop stops
    pub clarity_threshold: f64,
    pub max_self_questions: usize,
    /// Return the initial result without evaluating refinement
    pub skip_self_refinement: bool,
    /// Cumulative tokens after which no further cycle starts
    pub token_budget: u64,
}

impl DepthProfile {
    pub fn fast() -> Self {
        Self {
            max_iterations: 1,
            clarity_threshold: 65.0,
            max_self_questions: 1,
            skip_self_refinement: true,
            token_budget: 4_000,
        }
    }

    pub fn normal() -> Self {
        Self {
            max_iterations: 3,
            clarity_threshold: 80.0,
            max_self_questions: 3,
            skip_self_refinement: false,
            token_budget: 12_000,
        }
    }

    pub fn deep() -> Self {
        Self {
            max_iterations: 5,
            clarity_threshold: 88.0,
            max_self_questions: 5,
            skip_self_refinement: false,
            token_budget: 30_000,
        }
    }
}

impl Default for DepthProfile {
    fn default() -> Self {
        Self::normal()
    }
}

/// The three named profiles, overridable from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthProfiles {
    pub fast: DepthProfile,
    pub normal: DepthProfile,
    pub deep: DepthProfile,
}

impl DepthProfiles {
    pub fn get(&self, mode: DepthMode) -> DepthProfile {
        match mode {
            DepthMode::Fast => self.fast,
            DepthMode::Normal => self.normal,
            DepthMode::Deep => self.deep,
        }
    }

    /// Profile for a mode name; unknown names resolve to `normal`.
    pub fn resolve(&self, name: &str) -> DepthProfile {
        self.get(DepthMode::resolve(name))
    }

    pub fn set(&mut self, mode: DepthMode, profile: DepthProfile) {
        match mode {
            DepthMode::Fast => self.fast = profile,
            DepthMode::Normal => self.normal = profile,
            DepthMode::Deep => self.deep = profile,
        }
    }
}

impl Default for DepthProfiles {
    fn default() -> Self {
        Self {
            fast: DepthProfile::fast(),
            normal: DepthProfile::normal(),
            deep: DepthProfile::deep(),
        }
    }
}
