//! Change value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A source-code change to be evaluated by the council (Value Object)
///
/// Holds the unified diff text plus an optional commit message. The diff is
/// the only required part; everything else is advisory context for agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    diff: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ChangeSet {
    /// Create a new change from diff text.
    ///
    /// Returns an error if the diff is empty or only whitespace.
    pub fn new(diff: impl Into<String>) -> Result<Self, DomainError> {
        let diff = diff.into();
        if diff.trim().is_empty() {
            return Err(DomainError::InvalidChange("diff is empty".to_string()));
        }
        Ok(Self {
            diff,
            message: None,
        })
    }

    /// Attach the commit message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.trim().is_empty()).then_some(message);
        self
    }

    pub fn diff(&self) -> &str {
        &self.diff
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Size of the diff in bytes.
    pub fn len(&self) -> usize {
        self.diff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }

    /// Names of the files touched by the diff (`+++ b/<path>` headers).
    pub fn touched_files(&self) -> Vec<&str> {
        self.diff
            .lines()
            .filter_map(|line| line.strip_prefix("+++ "))
            .map(|path| path.trim_start_matches("b/").trim())
            .filter(|path| *path != "/dev/null")
            .collect()
    }
}
