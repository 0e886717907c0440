//! Hugging Face serverless inference.

use async_trait::async_trait;
use haulguard_core::{
    ApiConfig, Capability, ChatReply, ProviderRequest, ProviderResponse, ProviderTier, RateLimits,
    ResponseSource,
};
use haulguard_fetch::{ApiProvider, FetchContext, FetchError, ResponseExt};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::system_message;

/// Hugging Face text-generation endpoint for an instruction-tuned model.
pub fn huggingface_descriptor() -> ApiConfig {
    ApiConfig::new(
        "huggingface",
        "Hugging Face",
        "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.3",
        ProviderTier::Fallback,
        RateLimits::new(300, 5_000),
    )
    .with_capability(Capability::Nlp)
    .requiring_key()
}

/// One generated sequence.
#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

/// Pulls the first non-empty generation out of the response array.
fn first_generation(generations: Vec<Generation>) -> Result<String, FetchError> {
    generations
        .into_iter()
        .map(|g| g.generated_text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or_else(|| FetchError::InvalidResponse("huggingface returned no text".to_string()))
}

/// Hugging Face chat provider.
#[derive(Debug, Clone)]
pub struct HuggingFaceProvider {
    config: ApiConfig,
}

impl HuggingFaceProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Default for HuggingFaceProvider {
    fn default() -> Self {
        Self::new(huggingface_descriptor())
    }
}

#[async_trait]
impl ApiProvider for HuggingFaceProvider {
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

        let body = json!({
            "inputs": format!("[INST] {}\n\n{prompt} [/INST]", system_message(context.as_deref())),
            "parameters": { "max_new_tokens": 300, "return_full_text": false },
        });

        debug!(prompt_len = prompt.len(), "Requesting generation");
        let response = ctx.http.post_json(&self.config.base_url, &body, headers).await?;
        let generations: Vec<Generation> = response.json_or_error().await?;

        Ok(ProviderResponse::Chat(ChatReply {
            text: first_generation(generations)?,
            source: ResponseSource::Provider(self.id().to_string()),
            suggestions: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generation() {
        let json = r#"[{"generated_text": " Pull into the next rest area. "}]"#;
        let generations: Vec<Generation> = serde_json::from_str(json).unwrap();
        assert_eq!(first_generation(generations).unwrap(), "Pull into the next rest area.");
    }

    #[test]
    fn test_empty_generation() {
        assert!(first_generation(Vec::new()).is_err());
    }

    #[test]
    fn test_descriptor() {
        let provider = HuggingFaceProvider::default();
        assert_eq!(provider.tier(), ProviderTier::Fallback);
        assert!(!provider.is_available());
    }
}
