//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use promptcraft::llm::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
use promptcraft::LlmError;

/// What the mock upstream does for every request.
#[derive(Debug, Clone)]
pub enum Script {
    /// Normal completion with this text.
    Reply(String),
    /// Safety refusal with these raw categories.
    Blocked(Vec<String>),
    /// Transport failure.
    NetworkDown,
    /// HTTP error status from the API.
    Status(u16),
}

/// Mock LLM provider recording every request it receives.
pub struct MockLlmProvider {
    script: Script,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockLlmProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Script::Reply(text.to_string()))
    }

    pub fn blocking(categories: &[&str]) -> Self {
        Self::new(Script::Blocked(
            categories.iter().map(|c| c.to_string()).collect(),
        ))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("lock not poisoned").len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("lock not poisoned").clone()
    }

    /// Text of the last user message sent.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests()
            .last()
            .and_then(|r| r.messages.last())
            .map(|m| m.content.clone())
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.requests
            .lock()
            .expect("lock not poisoned")
            .push(request);

        match &self.script {
            Script::Reply(text) => Ok(GenerationResponse {
                id: "mock-id".to_string(),
                model: "mock-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(text.clone()),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage::default(),
            }),
            Script::Blocked(categories) => Err(LlmError::ContentBlocked {
                categories: categories.clone(),
            }),
            Script::NetworkDown => Err(LlmError::RequestFailed(
                "error sending request for url (https://example.invalid): connection refused"
                    .to_string(),
            )),
            Script::Status(code) => Err(LlmError::ApiError {
                code: *code,
                message: "upstream error".to_string(),
            }),
        }
    }
}
