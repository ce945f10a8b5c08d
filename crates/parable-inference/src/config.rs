//! Categorization configuration.
//!
//! Configuration can be loaded from:
//! - TOML files (`$PARABLE_CONFIG`, else `~/.config/parable/config.toml`)
//! - Environment variables (`PARABLE_*` prefixed, plus `ANTHROPIC_API_KEY`)
//!
//! # Example
//!
//! ```rust,no_run
//! use parable_inference::config::OrchestratorConfig;
//!
//! // Load from the config file if present, else from environment variables
//! let config = OrchestratorConfig::load().expect("Failed to load config");
//!
//! // Or explicitly from a file
//! let config = OrchestratorConfig::from_file(std::path::Path::new("parable.toml")).expect("Failed to load");
//! ```
//!
//! ```toml
//! [categorization]
//! confidence_threshold = 0.8
//! timeout_secs = 10
//! store_training_examples = true
//! remote_api_key = "${ANTHROPIC_API_KEY}"
//! remote_model = "claude-sonnet-4-20250514"
//!
//! [categorization.local]
//! heuristic_fallback = true
//! model_url = "http://127.0.0.1:11434"
//! model = "llama3.2:3b"
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use parable_core::defaults::{self, ANTHROPIC_URL, CONFIDENCE_THRESHOLD, LOCAL_MODEL};

use crate::anthropic::AnthropicConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for parable_core::Error {
    fn from(e: ConfigError) -> Self {
        parable_core::Error::Config(e.to_string())
    }
}

fn default_heuristic_fallback() -> bool {
    true
}

fn default_local_model() -> String {
    LOCAL_MODEL.to_string()
}

/// Local backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Use the keyword heuristic when no local model is ready.
    #[serde(default = "default_heuristic_fallback")]
    pub heuristic_fallback: bool,
    /// Ollama endpoint serving a local model. `None` disables the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
    /// Local model name.
    #[serde(default = "default_local_model")]
    pub model: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            heuristic_fallback: true,
            model_url: None,
            model: default_local_model(),
        }
    }
}

/// Orchestrator configuration.
#[derive(Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Minimum local confidence accepted without escalating.
    pub confidence_threshold: f64,
    /// Advisory per-backend call timeout, enforced by each backend.
    pub timeout: Duration,
    /// Capture a training example whenever the remote backend resolves an
    /// escalation.
    pub store_training_examples: bool,
    /// Remote API key. Empty means "not configured".
    pub remote_api_key: String,
    /// Remote model identifier.
    pub remote_model: String,
    /// Remote API base URL.
    pub remote_base_url: String,
    pub local: LocalConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            store_training_examples: defaults::STORE_TRAINING_EXAMPLES,
            remote_api_key: String::new(),
            remote_model: defaults::REMOTE_MODEL.to_string(),
            remote_base_url: ANTHROPIC_URL.to_string(),
            local: LocalConfig::default(),
        }
    }
}

impl std::fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("confidence_threshold", &self.confidence_threshold)
            .field("timeout", &self.timeout)
            .field("store_training_examples", &self.store_training_examples)
            .field("has_remote_api_key", &self.has_remote_api_key())
            .field("remote_model", &self.remote_model)
            .field("remote_base_url", &self.remote_base_url)
            .field("local", &self.local)
            .finish()
    }
}

/// On-disk shape of the `[categorization]` table.
#[derive(Debug, Serialize, Deserialize)]
struct TomlCategorization {
    #[serde(default)]
    confidence_threshold: Option<f64>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    store_training_examples: Option<bool>,
    #[serde(default)]
    remote_api_key: Option<String>,
    #[serde(default)]
    remote_model: Option<String>,
    #[serde(default)]
    remote_base_url: Option<String>,
    #[serde(default)]
    local: Option<LocalConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlRoot {
    categorization: TomlCategorization,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl OrchestratorConfig {
    /// Get the default config file path.
    ///
    /// Returns: ~/.config/parable/config.toml
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("parable");
        path.push("config.toml");
        path
    }

    /// Load configuration from `$PARABLE_CONFIG` or the default path,
    /// falling back to environment variables when no file exists.
    pub fn load() -> ConfigResult<Self> {
        if let Ok(explicit) = env::var(defaults::ENV_CONFIG) {
            let path = PathBuf::from(explicit);
            info!(path = %path.display(), "Loading categorization config");
            return Self::from_file(&path);
        }

        let path = Self::default_config_path();
        if path.exists() {
            info!(path = %path.display(), "Loading categorization config");
            Self::from_file(&path)
        } else {
            debug!(
                path = %path.display(),
                "Config file not found, using environment variables"
            );
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML file. `${VAR}` placeholders are
    /// replaced with environment values before parsing.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let content = Self::substitute_env_vars(content);
        let root: TomlRoot = toml::from_str(&content)?;
        let t = root.categorization;
        let d = Self::default();

        let config = Self {
            confidence_threshold: t.confidence_threshold.unwrap_or(d.confidence_threshold),
            timeout: t.timeout_secs.map(Duration::from_secs).unwrap_or(d.timeout),
            store_training_examples: t
                .store_training_examples
                .unwrap_or(d.store_training_examples),
            remote_api_key: t.remote_api_key.unwrap_or(d.remote_api_key),
            remote_model: t.remote_model.unwrap_or(d.remote_model),
            remote_base_url: t.remote_base_url.unwrap_or(d.remote_base_url),
            local: t.local.unwrap_or(d.local),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables. Unparseable values
    /// fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Self {
            confidence_threshold: get(defaults::ENV_CONFIDENCE_THRESHOLD)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(d.confidence_threshold),
            timeout: get(defaults::ENV_TIMEOUT_SECS)
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(d.timeout),
            store_training_examples: get(defaults::ENV_STORE_TRAINING_EXAMPLES)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(d.store_training_examples),
            remote_api_key: non_empty(defaults::ENV_REMOTE_API_KEY)
                .or_else(|| non_empty(defaults::ENV_ANTHROPIC_API_KEY))
                .unwrap_or_default(),
            remote_model: non_empty(defaults::ENV_REMOTE_MODEL).unwrap_or(d.remote_model),
            remote_base_url: non_empty(defaults::ENV_REMOTE_BASE_URL)
                .unwrap_or(d.remote_base_url),
            local: LocalConfig {
                heuristic_fallback: get(defaults::ENV_LOCAL_HEURISTIC)
                    .and_then(|v| parse_bool(&v))
                    .unwrap_or(d.local.heuristic_fallback),
                model_url: non_empty(defaults::ENV_LOCAL_MODEL_URL),
                model: non_empty(defaults::ENV_LOCAL_MODEL).unwrap_or(d.local.model),
            },
        }
    }

    pub fn has_remote_api_key(&self) -> bool {
        !self.remote_api_key.trim().is_empty()
    }

    /// Remote backend settings derived from this configuration.
    pub fn anthropic_config(&self) -> AnthropicConfig {
        AnthropicConfig {
            base_url: self.remote_base_url.clone(),
            api_key: self.remote_api_key.clone(),
            model: self.remote_model.clone(),
            timeout: self.timeout,
            ..AnthropicConfig::default()
        }
    }

    /// Validate the configuration. An empty API key is valid.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_threshold)
        {
            return Err(ConfigError::Validation(format!(
                "confidence_threshold must be between 0.0 and 1.0, got: {}",
                self.confidence_threshold
            )));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "timeout must be greater than zero".to_string(),
            ));
        }

        if self.remote_model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "remote_model cannot be empty".to_string(),
            ));
        }

        validate_url("remote_base_url", &self.remote_base_url)?;

        if let Some(ref url) = self.local.model_url {
            validate_url("local.model_url", url)?;
            if self.local.model.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "local.model cannot be empty when local.model_url is set".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Substitute `${VAR}` placeholders. Unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid")
        });
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

fn validate_url(field: &str, url: &str) -> ConfigResult<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} must start with http:// or https://, got: {}",
            field, url
        )));
    }
    Ok(())
}
