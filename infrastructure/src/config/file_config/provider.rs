//! Generation backend configuration from TOML (`[provider]` section)

use serde::{Deserialize, Serialize};

/// Supported generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileProviderKind {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// Any OpenAI-compatible chat completions endpoint
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

impl FileProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            FileProviderKind::Anthropic => "claude-sonnet-4-5",
            FileProviderKind::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            FileProviderKind::Anthropic => "https://api.anthropic.com",
            FileProviderKind::OpenAi => "https://api.openai.com",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            FileProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            FileProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Raw provider configuration from TOML
///
/// # Example
///
/// ```toml
/// [provider]
/// kind = "openai"
/// model = "gpt-4o-mini"
/// base_url = "http://localhost:11434"   # e.g. a local OpenAI-compatible server
/// api_key_env = "OPENAI_API_KEY"
/// ```
///
/// `api_key` may be set directly but the environment variable is preferred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub kind: FileProviderKind,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
}

impl FileProviderConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.kind.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .unwrap_or(self.kind.default_base_url())
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or(self.kind.default_api_key_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_kind() {
        let config = FileProviderConfig::default();
        assert_eq!(config.kind, FileProviderKind::Anthropic);
        assert_eq!(config.base_url(), "https://api.anthropic.com");
        assert_eq!(config.api_key_env(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_openai_compatible() {
        let config: FileProviderConfig = toml::from_str(
            r#"
kind = "openai"
model = "llama3"
base_url = "http://localhost:11434/"
"#,
        )
        .unwrap();
        assert_eq!(config.kind, FileProviderKind::OpenAi);
        assert_eq!(config.model(), "llama3");
        assert_eq!(config.base_url(), "http://localhost:11434");
        assert_eq!(config.api_key_env(), "OPENAI_API_KEY");
    }
}
