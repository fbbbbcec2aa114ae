//! Content analysis through the provider's built-in safety filtering.
//!
//! The text is sent with a plain "respond helpfully" instruction. Whether the
//! provider answers or refuses decides the classification; anything else is
//! treated as harmful.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::llm::{Completion, ModelClient};

use super::outcome::ModerationOutcome;

const ANALYSIS_INSTRUCTION: &str = "Respond helpfully to the following user input: ";

/// Render the instruction sent for analysis.
pub fn render_analysis_prompt(text: &str) -> String {
    format!("{ANALYSIS_INSTRUCTION}{text}")
}

/// Classifies user text as safe or harmful.
pub struct ContentAnalyzer {
    client: ModelClient,
}

impl ContentAnalyzer {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }

    /// Analyze `text`. Always produces an outcome; failures are fail-closed.
    pub async fn analyze(&self, text: &str) -> ModerationOutcome {
        let request_id = Uuid::new_v4();

        match self.client.complete(render_analysis_prompt(text)).await {
            Completion::Text(response) => {
                info!(%request_id, "Content passed provider safety filter");
                ModerationOutcome::safe(response)
            }
            Completion::SafetyBlocked(categories) => {
                warn!(%request_id, categories = ?categories, "Content blocked by provider safety filter");
                ModerationOutcome::blocked(categories)
            }
            Completion::Failed(e) => {
                error!(%request_id, error = %e, "Unexpected error during content analysis");
                ModerationOutcome::analysis_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{
        Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
    };
    use crate::moderation::outcome::{
        ANALYSIS_ERROR_RESPONSE, EMPTY_RESPONSE_FALLBACK, POLICY_VIOLATION_RESPONSE,
    };
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Scripted upstream behaviour.
    #[derive(Clone)]
    enum Upstream {
        Answer(String),
        Block(Vec<String>),
        Network,
    }

    /// Mock LLM provider for testing.
    struct MockLlmProvider {
        upstream: Upstream,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLlmProvider {
        fn new(upstream: Upstream) -> Self {
            Self {
                upstream,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            let prompt = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.prompts.lock().expect("lock not poisoned").push(prompt);

            match self.upstream.clone() {
                Upstream::Answer(text) => Ok(GenerationResponse {
                    id: "mock-id".to_string(),
                    model: "mock-model".to_string(),
                    choices: vec![Choice {
                        index: 0,
                        message: Message::assistant(text),
                        finish_reason: "stop".to_string(),
                    }],
                    usage: Usage::default(),
                }),
                Upstream::Block(categories) => Err(LlmError::ContentBlocked { categories }),
                Upstream::Network => Err(LlmError::RequestFailed(
                    "error sending request: connection refused".to_string(),
                )),
            }
        }
    }

    fn analyzer(upstream: Upstream) -> (ContentAnalyzer, Arc<MockLlmProvider>) {
        let provider = Arc::new(MockLlmProvider::new(upstream));
        (ContentAnalyzer::new(ModelClient::new(provider.clone())), provider)
    }

    #[test]
    fn test_render_analysis_prompt() {
        assert_eq!(
            render_analysis_prompt("What is photosynthesis?"),
            "Respond helpfully to the following user input: What is photosynthesis?"
        );
    }

    #[tokio::test]
    async fn test_normal_completion_is_safe() {
        let (analyzer, provider) = analyzer(Upstream::Answer(
            "Photosynthesis is how plants turn light into chemical energy.".to_string(),
        ));

        let outcome = analyzer.analyze("What is photosynthesis?").await;

        assert_eq!(
            outcome,
            ModerationOutcome {
                is_harmful: false,
                reasons: vec![],
                response: "Photosynthesis is how plants turn light into chemical energy."
                    .to_string(),
            }
        );
        assert_eq!(
            provider.prompts.lock().expect("lock not poisoned").as_slice(),
            ["Respond helpfully to the following user input: What is photosynthesis?"]
        );
    }

    #[tokio::test]
    async fn test_empty_completion_uses_fallback() {
        let (analyzer, _) = analyzer(Upstream::Answer(String::new()));
        let outcome = analyzer.analyze("hello").await;
        assert!(!outcome.is_harmful);
        assert_eq!(outcome.response, EMPTY_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn test_harassment_block() {
        let (analyzer, _) = analyzer(Upstream::Block(vec![
            "HARM_CATEGORY_HARASSMENT".to_string(),
        ]));

        let outcome = analyzer.analyze("I hate you").await;

        assert_eq!(
            outcome,
            ModerationOutcome {
                is_harmful: true,
                reasons: vec!["HARASSMENT".to_string()],
                response: POLICY_VIOLATION_RESPONSE.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_block_without_categories_is_unspecified() {
        let (analyzer, _) = analyzer(Upstream::Block(vec![]));
        let outcome = analyzer.analyze("something").await;
        assert!(outcome.is_harmful);
        assert_eq!(outcome.reasons, vec!["UNSPECIFIED"]);
    }

    #[tokio::test]
    async fn test_network_error_fails_closed() {
        let (analyzer, _) = analyzer(Upstream::Network);

        let outcome = analyzer.analyze("What is photosynthesis?").await;

        assert!(outcome.is_harmful);
        assert_eq!(outcome.reasons, vec!["ANALYSIS_ERROR"]);
        assert_eq!(outcome.response, ANALYSIS_ERROR_RESPONSE);
    }

    #[tokio::test]
    async fn test_repeated_analysis_is_identical() {
        for upstream in [
            Upstream::Answer("Sure, here you go.".to_string()),
            Upstream::Block(vec!["HARM_CATEGORY_HATE_SPEECH".to_string()]),
            Upstream::Network,
        ] {
            let (analyzer, provider) = analyzer(upstream);
            let first = analyzer.analyze("same input").await;
            let second = analyzer.analyze("same input").await;
            assert_eq!(first, second);
            assert_eq!(provider.prompts.lock().expect("lock not poisoned").len(), 2);
        }
    }
}
