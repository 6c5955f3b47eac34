//! Configuration file loading for pillar-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `PILLAR_COUNCIL_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. Global: `~/.config/pillar-council/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAgentEntry, FileConfig, FileDepthConfig, FileDepthOverride, FileEvaluationConfig,
    FileLoggingConfig, FileOutputConfig, FileProviderConfig, FileProviderKind, parse_roster,
};
pub use loader::{ConfigError, ConfigLoader};
