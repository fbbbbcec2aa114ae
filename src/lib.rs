//! promptcraft: prompt refinement and content-safety checks backed by a hosted LLM.
//!
//! This library provides the prompt validator and refiner, the content
//! analyzer that classifies text through the provider's safety filters, and
//! the provider layer both are built on.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod moderation;
pub mod refine;
pub mod utils;

// Re-export commonly used types
pub use config::{AppConfig, ProviderKind};
pub use error::{ConfigError, LlmError};
pub use moderation::{ContentAnalyzer, ModerationOutcome};
pub use refine::{FormState, PromptRefiner, RefinementRequest, RefinementResult};
