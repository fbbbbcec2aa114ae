//! Model client used by the refiner and the content analyzer.
//!
//! Wraps an injected [`LlmProvider`] together with the model settings for a
//! single call site. Cloning is cheap and shares the provider.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::LlmError;
use crate::llm::completion::Completion;
use crate::llm::{GenerationRequest, LlmProvider, Message, ResponseFormat};
use crate::utils::extract_json_object;

/// A provider plus the model parameters applied to every request.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl ModelClient {
    /// Create a client that uses the provider's default model.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: String::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Use a specific model instead of the provider default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Model identifier sent with requests; empty means provider default.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, messages: Vec<Message>) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.model.clone(), messages);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    /// Ask for free text and classify the outcome.
    pub async fn complete(&self, prompt: impl Into<String>) -> Completion {
        let request = self.request(vec![Message::user(prompt)]);
        Completion::from_result(self.provider.generate(request).await)
    }

    /// Ask for output matching `format` and deserialize it into `T`.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged, `LlmError::EmptyResponse` when
    /// the model produced no text, or `LlmError::ParseError` when the text
    /// does not hold a JSON object of the expected shape.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        messages: Vec<Message>,
        format: ResponseFormat,
    ) -> Result<T, LlmError> {
        let request = self.request(messages).with_response_format(format);
        let response = self.provider.generate(request).await?;

        let content = response
            .first_content()
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        let json = extract_json_object(content).map_err(|e| LlmError::ParseError(e.to_string()))?;

        serde_json::from_str(&json)
            .map_err(|e| LlmError::ParseError(format!("Unexpected structured output: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::Mutex;

    /// Mock provider that records the last request and returns fixed content.
    struct MockLlmProvider {
        response: String,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl MockLlmProvider {
        fn new(response: impl Into<String>) -> Self {
            Self {
                response: response.into(),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            *self.last_request.lock().expect("lock not poisoned") = Some(request);
            Ok(GenerationResponse {
                id: "mock-id".to_string(),
                model: "mock-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(self.response.clone()),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage::default(),
            })
        }
    }

    #[derive(Debug, Deserialize)]
    struct Answer {
        answer: String,
    }

    fn answer_format() -> ResponseFormat {
        ResponseFormat::json_schema("answer", serde_json::json!({"type": "object"}))
    }

    #[tokio::test]
    async fn test_complete_applies_model_settings() {
        let provider = Arc::new(MockLlmProvider::new("Sure."));
        let client = ModelClient::new(provider.clone())
            .with_model("gemini-2.0-flash")
            .with_temperature(0.4)
            .with_max_tokens(256);

        let completion = client.complete("Say something").await;
        assert!(matches!(completion, Completion::Text(t) if t == "Sure."));

        let request = provider
            .last_request
            .lock()
            .expect("lock not poisoned")
            .clone()
            .expect("request recorded");
        assert_eq!(request.model, "gemini-2.0-flash");
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.messages, vec![Message::user("Say something")]);
        assert!(request.response_format.is_none());
    }

    #[tokio::test]
    async fn test_generate_structured_parses_fenced_json() {
        let provider = Arc::new(MockLlmProvider::new(
            "```json\n{\"answer\": \"forty-two\"}\n```",
        ));
        let client = ModelClient::new(provider.clone());

        let parsed: Answer = client
            .generate_structured(vec![Message::user("q")], answer_format())
            .await
            .expect("should parse");
        assert_eq!(parsed.answer, "forty-two");

        let request = provider
            .last_request
            .lock()
            .expect("lock not poisoned")
            .clone()
            .expect("request recorded");
        assert_eq!(request.response_format, Some(answer_format()));
    }

    #[tokio::test]
    async fn test_generate_structured_empty_content() {
        let client = ModelClient::new(Arc::new(MockLlmProvider::new("   ")));
        let result: Result<Answer, _> = client
            .generate_structured(vec![Message::user("q")], answer_format())
            .await;
        assert!(matches!(result, Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_generate_structured_wrong_shape() {
        let client = ModelClient::new(Arc::new(MockLlmProvider::new(r#"{"other": 1}"#)));
        let result: Result<Answer, _> = client
            .generate_structured(vec![Message::user("q")], answer_format())
            .await;
        assert!(matches!(result, Err(LlmError::ParseError(_))));
    }
}
