//! LLM integration for promptcraft.
//!
//! This module provides the provider abstraction, the concrete hosted
//! providers, and the [`ModelClient`] that the refiner and the content
//! analyzer are built on.
//!
//! ```ignore
//! use promptcraft::llm::{Completion, GeminiProvider, ModelClient};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(GeminiProvider::new(api_key));
//! let client = ModelClient::new(provider).with_model("gemini-2.0-flash");
//!
//! match client.complete("What is photosynthesis?").await {
//!     Completion::Text(text) => println!("{text}"),
//!     Completion::SafetyBlocked(categories) => println!("blocked: {categories:?}"),
//!     Completion::Failed(err) => eprintln!("error: {err}"),
//! }
//! ```
//!
//! # Safety signals
//!
//! Each provider maps its own refusal format (Gemini `blockReason` and
//! safety ratings, OpenAI-style `content_filter`, OpenRouter 403 moderation
//! errors) onto [`crate::error::LlmError::ContentBlocked`].
//! [`Completion::from_result`] is the only place that distinction is read.

pub mod client;
pub mod completion;
pub mod litellm;
pub mod providers;

pub use client::ModelClient;
pub use completion::Completion;
pub use litellm::{
    Choice, GenerationRequest, GenerationResponse, LiteLlmClient, LlmProvider, Message,
    ResponseFormat, Usage,
};
pub use providers::{GeminiProvider, OpenRouterProvider};
