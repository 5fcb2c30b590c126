//! Configuration management
//!
//! Configuration is layered:
//! - Default values
//! - A configuration file (TOML, JSON or YAML, chosen by extension)
//! - Environment variables prefixed with `GATE__` (e.g. `GATE__LOGGING__LEVEL=debug`)
//!
//! Loading is generic so that downstream crates can compose their own
//! sections (the approval policy lives in `gate-approval`) on top of
//! [`AppConfig`].

use crate::error::{CoreError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "GATE";

/// Base application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Inference backend settings
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

/// Agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Agent name/identifier
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Maximum iterations for the agent loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// System prompt given to the model
    #[serde(default = "default_system_message")]
    pub system_message: String,
}

/// Chat-completion backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Provider label, used for logging only
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl InferenceConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CoreError::MissingEnv(self.api_key_env.clone())),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_agent_name() -> String {
    "office-assistant".to_string()
}

fn default_max_iterations() -> usize {
    5
}

fn default_system_message() -> String {
    "You are an office supply assistant. Check inventory and budget before buying. \
     Purchases may need a human's approval; if one is denied, explain that to the user \
     instead of retrying the same purchase."
        .to_string()
}

fn default_provider() -> String {
    "baseten".to_string()
}

fn default_base_url() -> String {
    "https://inference.baseten.co/v1".to_string()
}

fn default_model() -> String {
    "deepseek-ai/DeepSeek-V3.1".to_string()
}

fn default_api_key_env() -> String {
    "BASETEN_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            max_iterations: default_max_iterations(),
            system_message: default_system_message(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// The configuration file, with environment overrides
    File,
    /// Built-in defaults, with environment overrides
    Defaults,
}

/// The merged file and `GATE__` environment layers
///
/// Sections are read individually so that each one gets the `config`
/// crate's own string-to-number coercion for environment values.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    inner: config::Config,
    source: ConfigSource,
}

impl LayeredConfig {
    /// Build the layers; a missing file is an error when `required`
    pub fn load<P: AsRef<Path>>(path: P, required: bool) -> Result<Self> {
        let path = path.as_ref();
        let source = if path.exists() {
            ConfigSource::File
        } else if required {
            return Err(CoreError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        } else {
            ConfigSource::Defaults
        };

        let inner = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(environment())
            .build()?;

        if source == ConfigSource::File {
            tracing::info!("Configuration loaded from {}", path.display());
        }

        Ok(Self { inner, source })
    }

    /// Whether a file contributed to this configuration
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Deserialize the whole configuration
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(self.inner.clone().try_deserialize()?)
    }

    /// Deserialize one top-level section, `None` when no layer sets it
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.get::<T>(key) {
            Ok(section) => Ok(Some(section)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The shared `[logging]`, `[agent]` and `[inference]` sections
    pub fn app(&self) -> Result<AppConfig> {
        self.deserialize()
    }
}

/// `GATE__SECTION__KEY` variables; numbers and booleans are parsed
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a file, with `GATE__` environment overrides
///
/// # Example
///
/// ```no_run
/// use gate_core::config::{load_config, AppConfig};
///
/// let config: AppConfig = load_config("gatekeep.toml").unwrap();
/// println!("Model: {}", config.inference.model);
/// ```
pub fn load_config<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    LayeredConfig::load(path, true)?.deserialize()
}

/// Load configuration, using the built-in defaults when the file is missing
///
/// Environment overrides apply either way. A file that exists but fails to
/// parse is an error.
pub fn load_config_or_default<T, P>(path: P) -> Result<(T, ConfigSource)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let layered = LayeredConfig::load(path, false)?;
    Ok((layered.deserialize()?, layered.source()))
}
