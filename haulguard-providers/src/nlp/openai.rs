//! OpenAI chat completions.

use async_trait::async_trait;
use haulguard_core::{
    ApiConfig, Capability, ChatReply, ProviderRequest, ProviderResponse, ProviderTier, RateLimits,
    ResponseSource,
};
use haulguard_fetch::{ApiProvider, FetchContext, FetchError, ResponseExt};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::system_message;

/// Model used for completions.
const MODEL: &str = "gpt-4o-mini";

/// Reply length cap.
const MAX_TOKENS: u32 = 400;

/// OpenAI `/v1/chat/completions`.
pub fn openai_descriptor() -> ApiConfig {
    ApiConfig::new(
        "openai",
        "OpenAI",
        "https://api.openai.com/v1/chat/completions",
        ProviderTier::Primary,
        RateLimits::new(500, 10_000),
    )
    .with_capability(Capability::Nlp)
    .requiring_key()
    .with_cost_per_call(0.002)
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response body from chat completions.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatResponse {
    /// Returns the first non-empty completion.
    pub fn into_text(self) -> Result<String, FetchError> {
        self.choices
            .into_iter()
            .map(|c| c.message.content.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or_else(|| FetchError::InvalidResponse("openai returned no choices".to_string()))
    }
}

// ============================================================================
// Provider
// ============================================================================

/// OpenAI chat provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    config: ApiConfig,
}

impl OpenAiProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new(openai_descriptor())
    }
}

#[async_trait]
impl ApiProvider for OpenAiProvider {
    fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[instrument(skip(self, request, ctx), fields(provider = %self.config.name))]
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError> {
        let ProviderRequest::Chat { prompt, context } = request else {
            return Err(self.unsupported(request));
        };
        let key = self.require_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| FetchError::AuthenticationFailed(format!("invalid key: {e}")))?,
        );

        let body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_message(context.as_deref()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.clone(),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: 0.3,
        };

        debug!(prompt_len = prompt.len(), "Requesting completion");
        let response = ctx.http.post_json(&self.config.base_url, &body, headers).await?;
        let reply: ChatResponse = response.json_or_error().await?;

        Ok(ProviderResponse::Chat(ChatReply {
            text: reply.into_text()?,
            source: ResponseSource::Provider(self.id().to_string()),
            suggestions: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion() {
        let json = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Take your 30-minute break now. "}}]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().unwrap(), "Take your 30-minute break now.");
    }

    #[test]
    fn test_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.into_text().is_err());
    }

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            max_tokens: MAX_TOKENS,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
