//! Hosted LLM provider implementations.
//!
//! Each provider implements [`LlmProvider`] and maps its own safety signals
//! to [`crate::error::LlmError::ContentBlocked`].

pub mod gemini;
pub mod openrouter;

pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;

// Re-export the main LlmProvider trait from litellm for convenience
pub use super::litellm::LlmProvider;
