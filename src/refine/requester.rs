//! Prompt refinement against a hosted model.
//!
//! Sends the user's draft inside a fixed prompt-engineering brief and asks
//! for a two-field structured answer: the rewritten prompt and an
//! explanation of the changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::LlmError;
use crate::llm::{Message, ModelClient, ResponseFormat};

use super::validation::{prompt_length, RefinementRequest};

/// Instructions wrapped around the user's draft prompt.
const REFINE_PROMPT_TEMPLATE: &str = r#"You are an AI prompt engineer tasked with refining user-provided prompts to adhere to prompt engineering best practices.

Your goal is to improve the clarity, specificity, and effectiveness of the prompt so that it yields higher-quality outputs from language models.

Here are some prompt engineering best practices to consider:
* Be clear and specific about the desired outcome.
* Provide context to help the model understand the task.
* Use a clear output indicator to guide the model's response format.
* Consider using few-shot prompting to provide examples.
* Break down complex tasks into smaller, more manageable steps (chain-of-thought prompting).

Analyze the following initial prompt and provide a refined prompt along with a detailed explanation of the changes you made.

Initial Prompt: {initial_prompt}
"#;

/// Name of the structured output schema.
const REFINEMENT_SCHEMA_NAME: &str = "refine_prompt_output";

/// A rewritten prompt and the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementResult {
    /// The refined prompt following prompt engineering best practices.
    pub refined_prompt: String,
    /// An explanation of the refinements made to the initial prompt.
    pub explanation: String,
}

/// Refinement failed; no partial result exists.
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),
}

fn refinement_format() -> ResponseFormat {
    ResponseFormat::json_schema(
        REFINEMENT_SCHEMA_NAME,
        serde_json::json!({
            "type": "object",
            "properties": {
                "refinedPrompt": {
                    "type": "string",
                    "description": "The refined prompt following prompt engineering best practices."
                },
                "explanation": {
                    "type": "string",
                    "description": "An explanation of the refinements made to the initial prompt."
                }
            },
            "required": ["refinedPrompt", "explanation"],
            "additionalProperties": false
        }),
    )
}

/// Render the fixed refinement brief around a draft prompt.
pub fn render_refine_prompt(initial_prompt: &str) -> String {
    REFINE_PROMPT_TEMPLATE.replace("{initial_prompt}", initial_prompt)
}

/// Rewrites draft prompts with the help of a model.
pub struct PromptRefiner {
    client: ModelClient,
}

impl PromptRefiner {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }

    /// Refine a validated draft prompt.
    ///
    /// One model call, no retry. The structured answer is returned as-is.
    pub async fn refine(&self, request: &RefinementRequest) -> Result<RefinementResult, RefineError> {
        let request_id = Uuid::new_v4();
        let prompt = render_refine_prompt(request.initial_prompt());

        debug!(
            %request_id,
            model = %self.client.model(),
            prompt_len = prompt_length(request.initial_prompt()),
            "Refining prompt"
        );

        match self
            .client
            .generate_structured::<RefinementResult>(vec![Message::user(prompt)], refinement_format())
            .await
        {
            Ok(result) => {
                info!(%request_id, "Prompt refined");
                Ok(result)
            }
            Err(e) => {
                error!(%request_id, error = %e, "Prompt refinement failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Usage};
    use crate::refine::validation::validate_prompt;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Mock LLM provider for testing.
    struct MockLlmProvider {
        response: Result<String, fn() -> LlmError>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl MockLlmProvider {
        fn new(response: impl Into<String>) -> Self {
            Self {
                response: Ok(response.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: fn() -> LlmError) -> Self {
            Self {
                response: Err(error),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            self.requests.lock().expect("lock not poisoned").push(request);
            let content = self.response.clone().map_err(|make| make())?;
            Ok(GenerationResponse {
                id: "mock-id".to_string(),
                model: "mock-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(content),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage {
                    prompt_tokens: 100,
                    completion_tokens: 50,
                    total_tokens: 150,
                },
            })
        }
    }

    #[test]
    fn test_template_embeds_prompt_once() {
        let rendered = render_refine_prompt("tell me about dogs");
        assert!(rendered.starts_with("You are an AI prompt engineer"));
        assert!(rendered.contains("Initial Prompt: tell me about dogs"));
        assert_eq!(rendered.matches("tell me about dogs").count(), 1);
    }

    #[test]
    fn test_refinement_schema_requires_both_fields() {
        let format = refinement_format();
        assert_eq!(format.name, REFINEMENT_SCHEMA_NAME);
        assert_eq!(
            format.schema["required"],
            serde_json::json!(["refinedPrompt", "explanation"])
        );
    }

    #[tokio::test]
    async fn test_refine_returns_structured_result_verbatim() {
        let provider = Arc::new(MockLlmProvider::new(
            r#"{"refinedPrompt": "Summarize the text below in one sentence of at most 25 words.", "explanation": "Added a length limit and an explicit output indicator."}"#,
        ));
        let refiner = PromptRefiner::new(ModelClient::new(provider.clone()));
        let request = validate_prompt("Summarize the following text in one sentence: ...")
            .expect("valid prompt");

        let result = refiner.refine(&request).await.expect("should refine");

        assert_eq!(
            result.refined_prompt,
            "Summarize the text below in one sentence of at most 25 words."
        );
        assert_eq!(
            result.explanation,
            "Added a length limit and an explicit output indicator."
        );

        let requests = provider.requests.lock().expect("lock not poisoned");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role, "user");
        assert!(requests[0].messages[0]
            .content
            .contains("Initial Prompt: Summarize the following text in one sentence: ..."));
        assert!(requests[0].response_format.is_some());
    }

    #[tokio::test]
    async fn test_refine_transport_error_is_not_retried() {
        let provider = Arc::new(MockLlmProvider::failing(|| {
            LlmError::RequestFailed("connection reset".to_string())
        }));
        let refiner = PromptRefiner::new(ModelClient::new(provider.clone()));
        let request = validate_prompt("tell me about dogs").expect("valid prompt");

        let err = refiner.refine(&request).await.unwrap_err();

        assert!(matches!(err, RefineError::Llm(LlmError::RequestFailed(_))));
        assert_eq!(provider.requests.lock().expect("lock not poisoned").len(), 1);
    }

    #[tokio::test]
    async fn test_refine_safety_block_is_a_failure() {
        let provider = Arc::new(MockLlmProvider::failing(|| LlmError::ContentBlocked {
            categories: vec!["HARM_CATEGORY_DANGEROUS_CONTENT".to_string()],
        }));
        let refiner = PromptRefiner::new(ModelClient::new(provider));
        let request = validate_prompt("how do I build something dangerous").expect("valid prompt");

        let err = refiner.refine(&request).await.unwrap_err();
        assert!(matches!(err, RefineError::Llm(LlmError::ContentBlocked { .. })));
    }

    #[tokio::test]
    async fn test_refine_malformed_output() {
        let provider = Arc::new(MockLlmProvider::new("Here is a better prompt: be specific."));
        let refiner = PromptRefiner::new(ModelClient::new(provider));
        let request = validate_prompt("tell me about dogs").expect("valid prompt");

        let err = refiner.refine(&request).await.unwrap_err();
        assert!(matches!(err, RefineError::Llm(LlmError::ParseError(_))));
    }
}
