//! Text-generation backends
//!
//! [`ProviderGateway`] dispatches to the backend selected by the
//! `[provider]` config section.

mod anthropic;
mod openai;

pub use anthropic::AnthropicGateway;
pub use openai::OpenAiGateway;

use crate::config::{ConfigError, FileProviderConfig, FileProviderKind};
use async_trait::async_trait;
use council_application::ports::llm_gateway::{
    GatewayError, GenerationRequest, GenerationResponse, LlmGateway,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::info;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_CHARS: usize = 300;

/// The configured generation backend
pub enum ProviderGateway {
    Anthropic(AnthropicGateway),
    OpenAi(OpenAiGateway),
}

impl ProviderGateway {
    /// Build the gateway from config, reading the API key from config or the environment.
    pub fn from_config(config: &FileProviderConfig) -> Result<Self, ConfigError> {
        Self::build(config, |name| std::env::var(name).ok())
    }

    fn build(
        config: &FileProviderConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env(config.api_key_env()))
            .filter(|k| !k.trim().is_empty());

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {}", e)))?;

        let gateway = match config.kind {
            FileProviderKind::Anthropic => {
                let key = api_key.ok_or_else(|| ConfigError::MissingApiKey {
                    env: config.api_key_env().to_string(),
                })?;
                ProviderGateway::Anthropic(AnthropicGateway::new(
                    client,
                    config.base_url(),
                    config.model(),
                    key,
                ))
            }
            FileProviderKind::OpenAi => {
                // Only the hosted API insists on a key; local servers often run without one
                if api_key.is_none() && config.base_url() == config.kind.default_base_url() {
                    return Err(ConfigError::MissingApiKey {
                        env: config.api_key_env().to_string(),
                    });
                }
                ProviderGateway::OpenAi(OpenAiGateway::new(
                    client,
                    config.base_url(),
                    config.model(),
                    api_key,
                ))
            }
        };
        info!("Using generation backend {}", gateway.describe());
        Ok(gateway)
    }
}

#[async_trait]
impl LlmGateway for ProviderGateway {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GatewayError> {
        match self {
            ProviderGateway::Anthropic(gateway) => gateway.generate(request).await,
            ProviderGateway::OpenAi(gateway) => gateway.generate(request).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            ProviderGateway::Anthropic(gateway) => gateway.describe(),
            ProviderGateway::OpenAi(gateway) => gateway.describe(),
        }
    }
}

/// Map a non-success HTTP status to a gateway error.
pub(crate) fn map_status(status: StatusCode, body: &str, model: &str) -> GatewayError {
    let body: String = body.chars().take(ERROR_BODY_CHARS).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::AuthenticationFailed(format!("{}: {}", status, body))
        }
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(model.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(format!("{}: {}", status, body)),
    }
}

/// Map a transport-level reqwest error to a gateway error.
pub(crate) fn map_transport(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else if error.is_connect() {
        GatewayError::ConnectionError(error.to_string())
    } else if error.is_decode() {
        GatewayError::InvalidResponse(error.to_string())
    } else {
        GatewayError::RequestFailed(error.to_string())
    }
}
