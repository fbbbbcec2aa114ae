//! Form-submission handler for the prompt refiner.
//!
//! Turns one form submission into a [`FormState`] the front end can render:
//! validation issues, a generic failure message, or the refined prompt.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::requester::{PromptRefiner, RefinementResult};
use super::validation::{FormFields, RefinePromptForm, ValidationIssue};

pub const MSG_INVALID_FORM: &str = "Invalid form data.";
pub const MSG_REFINED: &str = "Prompt refined successfully.";
pub const MSG_REFINE_FAILED: &str = "An unexpected error occurred while refining the prompt.";

/// Result of a refinement form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub message: String,
    /// Submitted values, echoed back when validation fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FormFields>,
    /// Human-readable validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RefinementResult>,
}

impl FormState {
    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }

    pub fn has_issues(&self) -> bool {
        self.issues.as_ref().is_some_and(|i| !i.is_empty())
    }

    /// Rejected submission, echoing the submitted fields.
    pub fn invalid(form: &RefinePromptForm, issues: Vec<ValidationIssue>) -> Self {
        Self {
            message: MSG_INVALID_FORM.to_string(),
            fields: Some(form.to_fields()),
            issues: Some(issues.into_iter().map(|i| i.message).collect()),
            data: None,
        }
    }
}

/// Validate the form and, if valid, refine the prompt.
///
/// Never fails: model errors become the generic failure message.
pub async fn refine_prompt_action(refiner: &PromptRefiner, form: &RefinePromptForm) -> FormState {
    let request = match form.validate() {
        Ok(request) => request,
        Err(issues) => return FormState::invalid(form, issues),
    };

    match refiner.refine(&request).await {
        Ok(result) => FormState {
            message: MSG_REFINED.to_string(),
            data: Some(result),
            ..FormState::default()
        },
        Err(e) => {
            warn!(error = %e, "Returning generic refinement failure");
            FormState {
                message: MSG_REFINE_FAILED.to_string(),
                ..FormState::default()
            }
        }
    }
}
