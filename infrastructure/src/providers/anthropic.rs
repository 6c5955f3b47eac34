//! Anthropic Messages API gateway.

use super::{map_status, map_transport};
use async_trait::async_trait;
use council_application::ports::llm_gateway::{
    GatewayError, GenerationRequest, GenerationResponse, LlmGateway,
};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Value>,
}

/// Gateway for `POST {base_url}/v1/messages`
pub struct AnthropicGateway {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl AnthropicGateway {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_output_tokens,
            system: &request.system_instructions,
            messages: vec![Message {
                role: "user",
                content: &request.human_prompt,
            }],
        }
    }

    /// Concatenate the text blocks of a Messages API response body.
    fn parse_response(body: &str) -> Result<GenerationResponse, GatewayError> {
        let parsed: MessagesResponse = serde_json::from_str(body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let response = GenerationResponse::new(text);
        Ok(match parsed.usage {
            Some(usage) => response.with_usage(usage),
            None => response,
        })
    }
}

#[async_trait]
impl LlmGateway for AnthropicGateway {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GatewayError> {
        debug!("POST {} (model {})", self.endpoint(), self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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
        format!("anthropic:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let gateway = AnthropicGateway::new(Client::new(), "https://example.test", "m", "k");
        let request = GenerationRequest::new("system text", "human text", 512);
        let body = serde_json::to_value(gateway.body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "m",
                "max_tokens": 512,
                "system": "system text",
                "messages": [{"role": "user", "content": "human text"}]
            })
        );
        assert_eq!(gateway.endpoint(), "https://example.test/v1/messages");
    }

    #[test]
    fn test_empty_system_is_omitted() {
        let gateway = AnthropicGateway::new(Client::new(), "https://example.test", "m", "k");
        let request = GenerationRequest::new("", "human", 10);
        let body = serde_json::to_value(gateway.body(&request)).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "{\"summary\":"},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "\"ok\"}"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 7}
        }"#;
        let response = AnthropicGateway::parse_response(body).unwrap();
        assert_eq!(response.content, "{\"summary\":\"ok\"}");
        assert_eq!(response.usage.unwrap()["input_tokens"], 12);
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(matches!(
            AnthropicGateway::parse_response("<html>"),
            Err(GatewayError::InvalidResponse(_))
        ));
    }
}
