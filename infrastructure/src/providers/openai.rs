//! OpenAI-compatible chat completions gateway.

use super::{map_status, map_transport};
use async_trait::async_trait;
use council_application::ports::llm_gateway::{
    GatewayError, GenerationRequest, GenerationResponse, LlmGateway,
};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Value>,
}

/// Gateway for `POST {base_url}/v1/chat/completions`
///
/// Works with any server implementing the chat completions API; the bearer
/// token is omitted when no key is configured (local servers).
pub struct OpenAiGateway {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiGateway {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !request.system_instructions.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system_instructions,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.human_prompt,
        });
        ChatRequest {
            model: &self.model,
            max_tokens: request.max_output_tokens,
            messages,
        }
    }

    /// Content of the first choice of a chat completions response body.
    fn parse_response(body: &str) -> Result<GenerationResponse, GatewayError> {
        let parsed: ChatResponse = serde_json::from_str(body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        let response = GenerationResponse::new(content);
        Ok(match parsed.usage {
            Some(usage) => response.with_usage(usage),
            None => response,
        })
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GatewayError> {
        debug!("POST {} (model {})", self.endpoint(), self.model);
        let mut builder = self
            .client
            .post(self.endpoint())
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .json(&self.body(request))
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;
        if !status.is_success() {
            return Err(map_status(status, &body, &self.model));
        }
        Self::parse_response(&body)
    }

    fn describe(&self) -> String {
        format!("openai:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let gateway = OpenAiGateway::new(Client::new(), "http://localhost:11434", "llama3", None);
        let request = GenerationRequest::new("sys", "user prompt", 256);
        let body = serde_json::to_value(gateway.body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3",
                "max_tokens": 256,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "user prompt"}
                ]
            })
        );
        assert_eq!(
            gateway.endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
        }"#;
        let response = OpenAiGateway::parse_response(body).unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(response.usage.unwrap()["prompt_tokens"], 20);
    }

    #[test]
    fn test_parse_response_without_choices() {
        assert!(matches!(
            OpenAiGateway::parse_response(r#"{"choices": []}"#),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_null_content_is_empty() {
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        let response = OpenAiGateway::parse_response(body).unwrap();
        assert_eq!(response.content, "");
        assert!(response.usage.is_none());
    }
}
