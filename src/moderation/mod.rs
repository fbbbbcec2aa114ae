//! Content-safety analysis (guardrail demo backend).
//!
//! [`ContentAnalyzer::analyze`] never fails: a safety refusal becomes a
//! harmful outcome with normalized categories, and any other failure is
//! reported as harmful too.

pub mod analyzer;
pub mod outcome;

pub use analyzer::{render_analysis_prompt, ContentAnalyzer};
pub use outcome::{normalize_category, ModerationOutcome};
