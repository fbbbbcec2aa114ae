//! CLI command definitions for promptcraft.
//!
//! Three subcommands share one model client configuration:
//! `refine` improves a draft prompt, `analyze` runs a safety check and
//! `validate` checks a draft offline.

use std::io::Read;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use crate::config::{resolve_config_path, AppConfig, ProviderKind};
use crate::moderation::{ContentAnalyzer, ModerationOutcome};
use crate::refine::{
    prompt_length, refine_prompt_action, validate_prompt, FormState, PromptRefiner,
    RefinePromptForm,
};

/// Argument value meaning "read from standard input".
const STDIN_MARKER: &str = "-";

/// Prompt refinement and content-safety checks backed by a hosted LLM.
#[derive(Parser)]
#[command(name = "promptcraft")]
#[command(about = "Refine prompts and check content safety with a hosted LLM")]
#[command(version)]
#[command(
    long_about = "promptcraft rewrites draft prompts into clearer, more specific ones and checks text against the provider's safety filters.\n\nExample usage:\n  promptcraft refine \"tell me about dogs\"\n  echo \"What is photosynthesis?\" | promptcraft analyze - --json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// YAML config file (defaults to ./promptcraft.yaml when present).
    #[arg(short, long, global = true, env = "PROMPTCRAFT_CONFIG")]
    pub config: Option<String>,

    /// LLM provider (gemini, openrouter, litellm).
    #[arg(short, long, global = true)]
    pub provider: Option<String>,

    /// Model identifier, overriding config and environment.
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// API key, overriding the provider's key variable.
    #[arg(long, global = true)]
    pub api_key: Option<String>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Rewrite a draft prompt into a more effective one.
    Refine(PromptArgs),

    /// Check text against the provider's safety filters.
    #[command(alias = "check")]
    Analyze(AnalyzeArgs),

    /// Check a draft prompt's length without calling the model.
    Validate(PromptArgs),
}

/// Arguments for `promptcraft refine` and `promptcraft validate`.
#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// Draft prompt, or `-` to read it from stdin.
    pub prompt: String,

    /// Output JSON to stdout instead of text.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `promptcraft analyze`.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Text to analyze, or `-` to read it from stdin.
    pub text: String,

    /// Output JSON to stdout instead of text.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Refine(args) => run_refine_command(&cli, args).await,
        Commands::Analyze(args) => run_analyze_command(&cli, args).await,
        Commands::Validate(args) => run_validate_command(args),
    }
}

/// Layer CLI flags over the file and environment configuration.
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let path = resolve_config_path(cli.config.as_deref());
    let mut config = AppConfig::load(path.as_deref()).context("Failed to load configuration")?;

    if let Some(provider) = &cli.provider {
        let provider: ProviderKind = provider.parse()?;
        config = config.with_provider(provider);
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = Some(api_key.clone());
    }

    debug!(provider = %config.provider, model = %config.effective_model(), "Resolved configuration");
    Ok(config)
}

fn build_client(cli: &Cli) -> anyhow::Result<crate::llm::ModelClient> {
    let config = load_config(cli)?;
    config.build_client().map_err(|e| {
        anyhow::anyhow!(
            "Failed to initialize LLM client: {}. Provide --api-key or set the provider's API key variable.",
            e
        )
    })
}

/// Resolve a positional argument, reading stdin for `-`.
fn read_input(arg: &str) -> anyhow::Result<String> {
    if arg != STDIN_MARKER {
        return Ok(arg.to_string());
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;
    Ok(buf.trim_end_matches(['\n', '\r']).to_string())
}

async fn run_refine_command(cli: &Cli, args: &PromptArgs) -> anyhow::Result<()> {
    let form = RefinePromptForm::new(read_input(&args.prompt)?);

    // Validation needs no credentials; report it before touching config.
    if let Err(issues) = form.validate() {
        let state = FormState::invalid(&form, issues);
        print_form_state(&state, args.json)?;
        anyhow::bail!(state.message);
    }

    let refiner = PromptRefiner::new(build_client(cli)?);
    let state = refine_prompt_action(&refiner, &form).await;
    print_form_state(&state, args.json)?;

    if !state.is_success() {
        anyhow::bail!(state.message);
    }
    Ok(())
}

async fn run_analyze_command(cli: &Cli, args: &AnalyzeArgs) -> anyhow::Result<()> {
    let text = read_input(&args.text)?;
    let analyzer = ContentAnalyzer::new(build_client(cli)?);
    let outcome = analyzer.analyze(&text).await;
    print_outcome(&outcome, args.json)
}

fn run_validate_command(args: &PromptArgs) -> anyhow::Result<()> {
    let prompt = read_input(&args.prompt)?;

    match validate_prompt(&prompt) {
        Ok(request) => {
            if args.json {
                let output = serde_json::json!({
                    "valid": true,
                    "chars": prompt_length(request.initial_prompt()),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("✓ Prompt is valid ({} characters)", prompt_length(request.initial_prompt()));
            }
            Ok(())
        }
        Err(issues) => {
            let messages: Vec<String> = issues.into_iter().map(|i| i.message).collect();
            if args.json {
                let output = serde_json::json!({ "valid": false, "issues": messages });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for message in &messages {
                    println!("✗ {}", message);
                }
            }
            anyhow::bail!("Prompt is invalid")
        }
    }
}

fn print_form_state(state: &FormState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    match (&state.data, &state.issues) {
        (Some(result), _) => {
            println!("✓ {}", state.message);
            println!();
            println!("Refined prompt:");
            println!("{}", result.refined_prompt);
            println!();
            println!("Explanation:");
            println!("{}", result.explanation);
        }
        (None, Some(issues)) => {
            println!("✗ {}", state.message);
            for issue in issues {
                println!("  - {}", issue);
            }
        }
        (None, None) => println!("✗ {}", state.message),
    }
    Ok(())
}

fn print_outcome(outcome: &ModerationOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if outcome.is_harmful {
        println!("⚠ Harmful: {}", outcome.reasons.join(", "));
    } else {
        println!("✓ Safe");
    }
    println!();
    println!("{}", outcome.response);
    Ok(())
}
