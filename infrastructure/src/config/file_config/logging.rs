//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// # Example
///
/// ```toml
/// [logging]
/// transcript = ".council/last-run.jsonl"
/// append_transcript = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL evaluation transcript; disabled when unset
    pub transcript: Option<PathBuf>,
    /// Append to an existing transcript instead of truncating it
    pub append_transcript: bool,
}
