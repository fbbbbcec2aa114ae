//! Command-line interface for promptcraft.
//!
//! Provides commands for prompt refinement, content analysis and offline
//! prompt validation.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, AnalyzeArgs, Cli, Commands, PromptArgs};
