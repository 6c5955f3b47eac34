//! LLM Gateway port
//!
//! Defines the interface for communicating with text-generation backends.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// One generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instructions: String,
    pub human_prompt: String,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn new(
        system_instructions: impl Into<String>,
        human_prompt: impl Into<String>,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            system_instructions: system_instructions.into(),
            human_prompt: human_prompt.into(),
            max_output_tokens,
        }
    }
}

/// Raw backend output
///
/// `usage` is the backend's usage object as-is; naming differs between
/// backends and is normalized by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub content: String,
    pub usage: Option<Value>,
}

impl GenerationResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Value) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Gateway for text generation
///
/// This port defines how the application layer talks to generation
/// backends. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate one completion.
    async fn generate(&self, request: &GenerationRequest)
    -> Result<GenerationResponse, GatewayError>;

    /// Short backend/model label for logs.
    fn describe(&self) -> String {
        "llm".to_string()
    }
}
