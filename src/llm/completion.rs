//! Discriminated outcome of a free-text completion call.

use crate::error::LlmError;
use crate::llm::GenerationResponse;

/// What happened when the model was asked for text.
///
/// The provider layer decides which variant applies, so callers branch on
/// this enum instead of inspecting error internals.
#[derive(Debug)]
pub enum Completion {
    /// The model answered normally. May be empty.
    Text(String),
    /// The provider's safety filter refused; raw category identifiers.
    SafetyBlocked(Vec<String>),
    /// Any other failure: transport, API, or malformed response.
    Failed(LlmError),
}

impl Completion {
    /// Classify the result of a provider call.
    pub fn from_result(result: Result<GenerationResponse, LlmError>) -> Self {
        match result {
            Ok(response) => Completion::Text(response.first_content().unwrap_or_default().to_string()),
            Err(LlmError::ContentBlocked { categories }) => Completion::SafetyBlocked(categories),
            Err(err) => Completion::Failed(err),
        }
    }
}
