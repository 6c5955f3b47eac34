//! Infrastructure layer for pillar-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod retrieval;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileAgentEntry, FileConfig, FileDepthConfig, FileEvaluationConfig,
    FileLoggingConfig, FileOutputConfig, FileProviderConfig, FileProviderKind,
};
pub use logging::JsonlConversationLogger;
pub use providers::{AnthropicGateway, OpenAiGateway, ProviderGateway};
pub use retrieval::DiffRetriever;
