//! Moderation outcome and category normalization.

use serde::{Deserialize, Serialize};

/// Prefix Gemini puts on harm category identifiers.
pub const HARM_CATEGORY_PREFIX: &str = "HARM_CATEGORY_";

/// Reason used when a block carries no category.
pub const UNSPECIFIED_REASON: &str = "UNSPECIFIED";

/// Reason used when the analysis itself failed.
pub const ANALYSIS_ERROR_REASON: &str = "ANALYSIS_ERROR";

/// Fallback answer when the model returns empty text.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I am ready to help.";

/// Canned answer for blocked input.
pub const POLICY_VIOLATION_RESPONSE: &str =
    "I cannot process this request because it violates safety policies. Please try again with a different prompt.";

/// Canned answer when analysis fails.
pub const ANALYSIS_ERROR_RESPONSE: &str = "An unexpected error occurred while analyzing the content.";

/// Safe/harmful classification and the answer to show.
///
/// Harmful outcomes always carry at least one reason and a canned response;
/// safe outcomes carry no reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationOutcome {
    pub is_harmful: bool,
    pub reasons: Vec<String>,
    pub response: String,
}

impl ModerationOutcome {
    /// Normal completion. Empty text is replaced by a fixed greeting.
    pub fn safe(response: impl Into<String>) -> Self {
        let response = response.into();
        Self {
            is_harmful: false,
            reasons: Vec::new(),
            response: if response.is_empty() {
                EMPTY_RESPONSE_FALLBACK.to_string()
            } else {
                response
            },
        }
    }

    /// Provider safety block with raw category identifiers.
    pub fn blocked<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut reasons: Vec<String> = categories
            .into_iter()
            .map(|c| normalize_category(c.as_ref()))
            .collect();
        if reasons.is_empty() {
            reasons.push(UNSPECIFIED_REASON.to_string());
        }

        Self {
            is_harmful: true,
            reasons,
            response: POLICY_VIOLATION_RESPONSE.to_string(),
        }
    }

    /// Analysis failed for a reason other than a safety block.
    pub fn analysis_error() -> Self {
        Self {
            is_harmful: true,
            reasons: vec![ANALYSIS_ERROR_REASON.to_string()],
            response: ANALYSIS_ERROR_RESPONSE.to_string(),
        }
    }
}

/// `HARM_CATEGORY_SEXUALLY_EXPLICIT` -> `SEXUALLY EXPLICIT`.
///
/// Only the first occurrence of the prefix is removed; every underscore
/// becomes a space.
pub fn normalize_category(category: &str) -> String {
    category
        .replacen(HARM_CATEGORY_PREFIX, "", 1)
        .replace('_', " ")
}
