//! OpenRouter provider implementation.
//!
//! OpenRouter exposes many hosted models behind one OpenAI-compatible
//! endpoint. Its moderation layer rejects flagged input with HTTP 403 and a
//! list of reasons, which this provider reports as
//! [`LlmError::ContentBlocked`].

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::LlmError;
use crate::llm::litellm::{http_client, post_chat_completions, ApiRequest, DEFAULT_TIMEOUT_SECS};
use crate::llm::{GenerationRequest, GenerationResponse, LlmProvider};

/// Default OpenRouter API endpoint.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model to use if none specified.
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// OpenRouter provider for LLM requests.
///
/// Requests are sent exactly once; failures are returned to the caller
/// without retrying.
pub struct OpenRouterProvider {
    /// HTTP client for making API requests.
    client: Client,
    /// API key for OpenRouter authentication.
    api_key: String,
    /// Base URL for the OpenRouter API.
    base_url: String,
    /// Default model to use when none is specified.
    default_model: String,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    /// Create a new OpenRouter provider with a specific default model.
    pub fn with_model(api_key: String, model: String) -> Self {
        Self::with_custom_url(api_key, OPENROUTER_BASE_URL.to_string(), model)
    }

    /// Create a new OpenRouter provider with custom base URL.
    ///
    /// Useful for testing or using OpenRouter-compatible proxies.
    pub fn with_custom_url(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: model,
        }
    }

    /// Replace the transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Get the API key (for debugging, returns masked value).
    pub fn api_key_masked(&self) -> String {
        mask_key(&self.api_key)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Mask all but the first and last four characters of a secret.
pub(crate) fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let api_request = ApiRequest::from_generation(request, &self.default_model);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = %api_request.model, "Sending OpenRouter request");

        let http_request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", "https://promptcraft.local")
            .header("X-Title", "promptcraft");

        post_chat_completions(http_request, &api_request).await
    }
}
