//! Error types for promptcraft operations.
//!
//! Defines error types for the subsystems shared across the crate:
//! - LLM API interactions
//! - Configuration loading and validation

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Content blocked by provider safety filter: [{}]", categories.join(", "))]
    ContentBlocked { categories: Vec<String> },

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Model returned no content")]
    EmptyResponse,
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable or config field has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// IO error while reading a configuration file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error in a configuration file.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_blocked_display_lists_categories() {
        let err = LlmError::ContentBlocked {
            categories: vec![
                "HARM_CATEGORY_HARASSMENT".to_string(),
                "HARM_CATEGORY_HATE_SPEECH".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Content blocked by provider safety filter: [HARM_CATEGORY_HARASSMENT, HARM_CATEGORY_HATE_SPEECH]"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = LlmError::ApiError {
            code: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (503): overloaded");
    }
}
