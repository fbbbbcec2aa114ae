//! Smart prompt refiner.
//!
//! - [`validation`]: length bounds on the submitted draft
//! - [`requester`]: the model round trip producing a [`RefinementResult`]
//! - [`action`]: form handling that combines the two into a [`FormState`]

pub mod action;
pub mod requester;
pub mod validation;

pub use action::{refine_prompt_action, FormState};
pub use requester::{render_refine_prompt, PromptRefiner, RefineError, RefinementResult};
pub use validation::{
    prompt_length, validate_prompt, FormError, FormFields, RefinePromptForm, RefinementRequest, ValidationIssue,
    MAX_PROMPT_CHARS, MIN_PROMPT_CHARS,
};
