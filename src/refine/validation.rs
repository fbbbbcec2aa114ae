//! Input validation for prompt refinement submissions.
//!
//! A [`RefinementRequest`] can only be obtained through [`validate_prompt`],
//! so out-of-bounds text never reaches the model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Form field carrying the draft prompt.
pub const INITIAL_PROMPT_FIELD: &str = "initialPrompt";

/// Minimum prompt length (inclusive), see [`prompt_length`].
pub const MIN_PROMPT_CHARS: usize = 10;

/// Maximum prompt length (inclusive), see [`prompt_length`].
pub const MAX_PROMPT_CHARS: usize = 500;

/// Raw form values keyed by field name.
pub type FormFields = BTreeMap<String, String>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A draft prompt whose length is within bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementRequest {
    initial_prompt: String,
}

impl RefinementRequest {
    pub fn initial_prompt(&self) -> &str {
        &self.initial_prompt
    }
}

/// The form shape is wrong. This is a caller bug, not user input to report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Form is missing required field '{0}'")]
    MissingField(String),
}

/// Typed view of the refinement form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinePromptForm {
    pub initial_prompt: String,
}

impl RefinePromptForm {
    pub fn new(initial_prompt: impl Into<String>) -> Self {
        Self {
            initial_prompt: initial_prompt.into(),
        }
    }

    /// Pull the form out of raw field values.
    pub fn from_fields(fields: &FormFields) -> Result<Self, FormError> {
        fields
            .get(INITIAL_PROMPT_FIELD)
            .map(|value| Self::new(value.clone()))
            .ok_or_else(|| FormError::MissingField(INITIAL_PROMPT_FIELD.to_string()))
    }

    /// Field values for re-display after a rejected submission.
    pub fn to_fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        fields.insert(INITIAL_PROMPT_FIELD.to_string(), self.initial_prompt.clone());
        fields
    }

    pub fn validate(&self) -> Result<RefinementRequest, Vec<ValidationIssue>> {
        validate_prompt(&self.initial_prompt)
    }
}

/// Length of a prompt in UTF-16 code units.
///
/// Matches how browser form validation counts characters, so a character
/// outside the Basic Multilingual Plane (most emoji) counts as two.
pub fn prompt_length(prompt: &str) -> usize {
    prompt.encode_utf16().count()
}

/// Check a draft prompt against the length bounds.
pub fn validate_prompt(initial_prompt: &str) -> Result<RefinementRequest, Vec<ValidationIssue>> {
    let length = prompt_length(initial_prompt);
    let mut issues = Vec::new();

    if length < MIN_PROMPT_CHARS {
        issues.push(ValidationIssue::new(
            INITIAL_PROMPT_FIELD,
            format!("Prompt must be at least {MIN_PROMPT_CHARS} characters."),
        ));
    }
    if length > MAX_PROMPT_CHARS {
        issues.push(ValidationIssue::new(
            INITIAL_PROMPT_FIELD,
            format!("Prompt cannot exceed {MAX_PROMPT_CHARS} characters."),
        ));
    }

    if issues.is_empty() {
        Ok(RefinementRequest {
            initial_prompt: initial_prompt.to_string(),
        })
    } else {
        Err(issues)
    }
}
