//! JSON extraction utilities for parsing LLM responses.
//!
//! Structured-output requests usually come back as a bare JSON object, but
//! some models still wrap it in markdown fences or add a sentence before it.
//! The extraction tries, in order:
//! 1. Direct JSON (content starts with '{')
//! 2. JSON in a ```json code block
//! 3. JSON in a generic code block
//! 4. The first balanced JSON object anywhere in the content
//!
//! # Example
//!
//! ```
//! use promptcraft::utils::json_extraction::extract_json_object;
//!
//! let response = "Here you go: {\"refinedPrompt\": \"x\", \"explanation\": \"y\"}";
//! let json = extract_json_object(response).unwrap();
//! assert!(json.starts_with('{'));
//! ```

use regex::Regex;
use thiserror::Error;

/// Error type for JSON extraction failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JsonExtractionError {
    #[error("JSON appears truncated: {unclosed_braces} unclosed braces. Partial: {partial_preview}...")]
    Truncated {
        partial_preview: String,
        unclosed_braces: usize,
    },
    #[error("No JSON content found in response. Content starts with: '{content_preview}'")]
    NotFound { content_preview: String },
}

/// Number of characters kept in error previews.
const PREVIEW_CHARS: usize = 80;

/// Extract the JSON object held in an LLM response.
///
/// # Errors
///
/// `Truncated` when an object starts but never closes (usually a
/// `max_tokens` cut-off), `NotFound` when no object is present.
pub fn extract_json_object(content: &str) -> Result<String, JsonExtractionError> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') {
        if let Some(json) = balanced_object(trimmed) {
            return Ok(json);
        }
    }

    if let Some(json) = extract_from_code_block(trimmed, true) {
        return Ok(json);
    }

    if let Some(json) = extract_from_code_block(trimmed, false) {
        return Ok(json);
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(json) = balanced_object(&trimmed[start..]) {
            return Ok(json);
        }

        let unclosed_braces = count_unclosed_braces(&trimmed[start..]);
        if unclosed_braces > 0 {
            return Err(JsonExtractionError::Truncated {
                partial_preview: preview(&trimmed[start..]),
                unclosed_braces,
            });
        }
    }

    Err(JsonExtractionError::NotFound {
        content_preview: preview(trimmed),
    })
}

/// Return the balanced object at the start of `s` if it parses as JSON.
fn balanced_object(s: &str) -> Option<String> {
    let end = find_matching_brace(s)?;
    let candidate = &s[..=end];
    serde_json::from_str::<serde_json::Value>(candidate)
        .ok()
        .map(|_| candidate.to_string())
}

/// Extract an object from a fenced code block.
///
/// With `json_only`, only blocks tagged ```json are considered.
fn extract_from_code_block(content: &str, json_only: bool) -> Option<String> {
    let pattern = if json_only {
        r"```json\s*\n?([\s\S]*?)\n?```"
    } else {
        r"```(?:\w+)?\s*\n?([\s\S]*?)\n?```"
    };
    let re = Regex::new(pattern).ok()?;
    let block = re.captures(content)?.get(1)?.as_str().trim();
    let start = block.find('{')?;
    balanced_object(&block[start..])
}

/// Find the index of the brace closing the object that starts `s`.
///
/// Braces inside string literals (including escaped quotes) are ignored.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn count_unclosed_braces(s: &str) -> usize {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for c in s.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    depth
}

fn preview(s: &str) -> String {
    s.chars().take(PREVIEW_CHARS).collect()
}
