//! Application configuration.
//!
//! Settings are layered: defaults, then an optional YAML file, then
//! environment variables. The CLI applies its own flags on top before
//! calling [`AppConfig::validate`] and [`AppConfig::build_provider`].

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::litellm::DEFAULT_TIMEOUT_SECS;
use crate::llm::providers::{gemini, openrouter};
use crate::llm::{GeminiProvider, LiteLlmClient, LlmProvider, ModelClient, OpenRouterProvider};

/// Which hosted API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini `generateContent`.
    #[default]
    #[serde(alias = "google", alias = "googleai")]
    Gemini,
    /// OpenRouter chat completions.
    OpenRouter,
    /// A LiteLLM (or other OpenAI-compatible) proxy.
    LiteLlm,
}

impl ProviderKind {
    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
            ProviderKind::OpenRouter => openrouter::DEFAULT_MODEL,
            ProviderKind::LiteLlm => "gemini/gemini-2.0-flash",
        }
    }

    /// Environment variables consulted for the API key, in priority order.
    pub fn api_key_vars(self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            ProviderKind::OpenRouter => &["OPENROUTER_API_KEY"],
            ProviderKind::LiteLlm => &["LITELLM_API_KEY"],
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "googleai" | "google" => Ok(ProviderKind::Gemini),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "litellm" => Ok(ProviderKind::LiteLlm),
            other => Err(ConfigError::InvalidValue {
                key: "provider".to_string(),
                message: format!("unknown provider '{}' (expected gemini, openrouter or litellm)", other),
            }),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::LiteLlm => "litellm",
        };
        f.write_str(name)
    }
}

/// Configuration for the model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hosted API to use.
    pub provider: ProviderKind,
    /// Model identifier; provider default when unset.
    pub model: Option<String>,
    /// Override for the API base URL (required for LiteLLM).
    pub api_base: Option<String>,
    /// API key. Prefer the environment over putting this in a file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Transport timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Output token limit.
    pub max_tokens: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            api_base: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl AppConfig {
    /// Load defaults, an optional YAML file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env()
    }

    /// Read configuration from a YAML file. Missing fields take defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&content)?;
        tracing::debug!(path = %path.display(), provider = %config.provider, "Loaded config file");
        Ok(config)
    }

    /// Creates configuration from environment variables over the defaults.
    ///
    /// # Environment Variables
    ///
    /// - `PROMPTCRAFT_PROVIDER`: gemini, openrouter or litellm (default: gemini)
    /// - `PROMPTCRAFT_MODEL`: model identifier
    /// - `PROMPTCRAFT_API_BASE`: API base URL (`LITELLM_API_BASE` also accepted)
    /// - `PROMPTCRAFT_TIMEOUT_SECS`: transport timeout (default: 120)
    /// - `PROMPTCRAFT_TEMPERATURE`: sampling temperature
    /// - `PROMPTCRAFT_MAX_TOKENS`: output token limit
    /// - provider key: `GEMINI_API_KEY`/`GOOGLE_API_KEY`, `OPENROUTER_API_KEY`
    ///   or `LITELLM_API_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(process_env)
    }

    /// Apply variables from `env` over the current values.
    ///
    /// A provider key variable overrides a key from the file. Switching
    /// provider drops a key that belonged to the previous one.
    fn apply_env_with<F>(mut self, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = env("PROMPTCRAFT_PROVIDER") {
            let provider: ProviderKind = val.parse()?;
            if provider != self.provider {
                self.provider = provider;
                self.api_key = None;
            }
        }

        if let Some(val) = env("PROMPTCRAFT_MODEL") {
            self.model = Some(val);
        }

        if let Some(val) = non_empty(&env, "PROMPTCRAFT_API_BASE")
            .or_else(|| non_empty(&env, "LITELLM_API_BASE"))
        {
            self.api_base = Some(val);
        }

        if let Some(val) = env("PROMPTCRAFT_TIMEOUT_SECS") {
            self.timeout_secs = parse_env_value(&val, "PROMPTCRAFT_TIMEOUT_SECS")?;
        }

        if let Some(val) = env("PROMPTCRAFT_TEMPERATURE") {
            self.temperature = Some(parse_env_value(&val, "PROMPTCRAFT_TEMPERATURE")?);
        }

        if let Some(val) = env("PROMPTCRAFT_MAX_TOKENS") {
            self.max_tokens = Some(parse_env_value(&val, "PROMPTCRAFT_MAX_TOKENS")?);
        }

        if let Some(key) = provider_key(self.provider, &env) {
            self.api_key = Some(key);
        }

        Ok(self)
    }

    /// Switch provider, taking that provider's key from the environment.
    ///
    /// The previous provider's key is never carried over. Apply `--api-key`
    /// after this call.
    pub fn with_provider(self, provider: ProviderKind) -> Self {
        self.with_provider_using(provider, process_env)
    }

    fn with_provider_using<F>(mut self, provider: ProviderKind, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if provider != self.provider {
            self.provider = provider;
            self.api_key = provider_key(provider, &env);
        }
        self
    }

    /// Model that will be requested.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Transport timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` for out-of-range values and
    /// `ConfigError::MissingEnvVar` when a hosted provider has no API key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "model cannot be empty".to_string(),
                ));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::ValidationFailed(
                    "temperature must be between 0.0 and 2.0".to_string(),
                ));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        match self.provider {
            ProviderKind::Gemini | ProviderKind::OpenRouter if self.api_key.is_none() => {
                Err(ConfigError::MissingEnvVar(
                    self.provider.api_key_vars().join(" or "),
                ))
            }
            ProviderKind::LiteLlm if self.api_base.is_none() => Err(ConfigError::MissingEnvVar(
                "PROMPTCRAFT_API_BASE or LITELLM_API_BASE".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Construct the configured provider.
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        self.validate()?;

        let model = self.effective_model().to_string();
        let timeout = self.timeout();
        let api_key = self.api_key.clone().unwrap_or_default();

        let provider: Arc<dyn LlmProvider> = match self.provider {
            ProviderKind::Gemini => {
                let provider = match &self.api_base {
                    Some(base) => GeminiProvider::with_custom_url(api_key, base.clone(), model),
                    None => GeminiProvider::with_model(api_key, model),
                };
                Arc::new(provider.timeout(timeout))
            }
            ProviderKind::OpenRouter => {
                let provider = match &self.api_base {
                    Some(base) => OpenRouterProvider::with_custom_url(api_key, base.clone(), model),
                    None => OpenRouterProvider::with_model(api_key, model),
                };
                Arc::new(provider.timeout(timeout))
            }
            ProviderKind::LiteLlm => Arc::new(LiteLlmClient::with_timeout(
                self.api_base.clone().unwrap_or_default(),
                self.api_key.clone(),
                model,
                timeout,
            )),
        };

        tracing::info!(
            provider = %self.provider,
            model = %self.effective_model(),
            "Configured LLM provider"
        );
        Ok(provider)
    }

    /// Construct a [`ModelClient`] carrying the configured model settings.
    pub fn build_client(&self) -> Result<ModelClient, ConfigError> {
        let mut client = ModelClient::new(self.build_provider()?).with_model(self.effective_model());
        if let Some(temperature) = self.temperature {
            client = client.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            client = client.with_max_tokens(max_tokens);
        }
        Ok(client)
    }
}

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "promptcraft.yaml";

/// Resolve the config file: an explicit path, or the default file if present.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty<F: Fn(&str) -> Option<String>>(env: &F, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// First non-empty key variable for `provider`.
fn provider_key<F: Fn(&str) -> Option<String>>(provider: ProviderKind, env: &F) -> Option<String> {
    provider
        .api_key_vars()
        .iter()
        .find_map(|var| non_empty(env, var))
}

/// Parse an environment variable value into a typed value.
fn parse_env_value<T: FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
