//! Shared utility functions for promptcraft.
//!
//! Currently JSON extraction from LLM responses.

pub mod json_extraction;

pub use json_extraction::{extract_json_object, JsonExtractionError};
