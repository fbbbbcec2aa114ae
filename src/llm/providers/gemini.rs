//! Google Gemini provider using the native `generateContent` API.
//!
//! Gemini applies its safety settings server-side. A refused prompt comes
//! back as `promptFeedback.blockReason`, a refused answer as a candidate with
//! a safety finish reason; both carry per-category safety ratings
//! (`HARM_CATEGORY_*`). This provider turns either signal into
//! [`LlmError::ContentBlocked`] with the offending categories.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LlmError;
use crate::llm::litellm::{error_from_status, http_client, DEFAULT_TIMEOUT_SECS};
use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};

/// Default Gemini API endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model to use if none specified.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Candidate finish reasons that mean the output was withheld by a filter.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

/// Gemini provider for LLM requests.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GeminiProvider {
    /// Create a provider for the default model.
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    /// Create a provider with a specific default model.
    pub fn with_model(api_key: String, model: String) -> Self {
        Self::with_custom_url(api_key, GEMINI_BASE_URL.to_string(), model)
    }

    /// Create a provider against a custom endpoint.
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

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };
        let url = self.endpoint(&model);
        let body = GeminiRequest::from_generation(request);

        tracing::debug!(model = %model, "Sending Gemini generateContent request");

        let http_response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(error_from_status(status.as_u16(), &error_text));
        }

        let api_response: GeminiResponse = http_response.json().await.map_err(|e| {
            LlmError::ParseError(format!("Failed to parse Gemini response: {}", e))
        })?;

        response_from_gemini(api_response, &model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

impl GeminiRequest {
    fn from_generation(request: GenerationRequest) -> Self {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in request.messages {
            match message.role.as_str() {
                "system" => system_parts.push(GeminiPart {
                    text: message.content,
                }),
                role => {
                    let role = if role == "assistant" { "model" } else { "user" };
                    contents.push(GeminiContent {
                        role: Some(role.to_string()),
                        parts: vec![GeminiPart {
                            text: message.content,
                        }],
                    });
                }
            }
        }

        let system_instruction = (!system_parts.is_empty()).then(|| GeminiContent {
            role: None,
            parts: system_parts,
        });

        let (response_mime_type, response_schema) = match request.response_format {
            Some(format) => (
                Some("application/json".to_string()),
                Some(to_gemini_schema(&format.schema)),
            ),
            None => (None, None),
        };

        Self {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                top_p: request.top_p,
                response_mime_type,
                response_schema,
            },
        }
    }
}

/// Convert a JSON schema to Gemini's OpenAPI-subset dialect.
///
/// Type names become upper case and keywords Gemini rejects are dropped.
fn to_gemini_schema(schema: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match schema {
        Value::Object(map) => {
            let converted = map
                .iter()
                .filter(|(key, _)| !matches!(key.as_str(), "additionalProperties" | "$schema"))
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", Value::String(t)) => Value::String(t.to_uppercase()),
                        _ => to_gemini_schema(value),
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(converted)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
    #[serde(default)]
    index: u32,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Deserialize)]
struct SafetyRating {
    category: String,
    #[serde(default)]
    probability: String,
    #[serde(default)]
    blocked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Categories responsible for a block.
///
/// Ratings flagged `blocked` win; otherwise any MEDIUM or HIGH rating counts.
fn blocked_categories(ratings: &[SafetyRating]) -> Vec<String> {
    let flagged: Vec<String> = ratings
        .iter()
        .filter(|r| r.blocked)
        .map(|r| r.category.clone())
        .collect();
    if !flagged.is_empty() {
        return flagged;
    }

    ratings
        .iter()
        .filter(|r| matches!(r.probability.as_str(), "MEDIUM" | "HIGH"))
        .map(|r| r.category.clone())
        .collect()
}

fn response_from_gemini(
    api_response: GeminiResponse,
    requested_model: &str,
) -> Result<GenerationResponse, LlmError> {
    if let Some(feedback) = &api_response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            tracing::debug!(block_reason = %reason, "Gemini blocked the prompt");
            return Err(LlmError::ContentBlocked {
                categories: blocked_categories(&feedback.safety_ratings),
            });
        }
    }

    if let Some(first) = api_response.candidates.first() {
        if let Some(reason) = first.finish_reason.as_deref() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                tracing::debug!(finish_reason = %reason, "Gemini withheld the candidate");
                return Err(LlmError::ContentBlocked {
                    categories: blocked_categories(&first.safety_ratings),
                });
            }
        }
    }

    let choices = api_response
        .candidates
        .into_iter()
        .map(|candidate| {
            let text: String = candidate
                .content
                .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                .unwrap_or_default();
            Choice {
                index: candidate.index,
                message: Message::assistant(text),
                finish_reason: candidate
                    .finish_reason
                    .map(|r| r.to_lowercase())
                    .unwrap_or_else(|| "stop".to_string()),
            }
        })
        .collect();

    let usage = api_response
        .usage_metadata
        .map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    Ok(GenerationResponse {
        id: api_response.response_id.unwrap_or_default(),
        model: api_response
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        choices,
        usage,
    })
}
