//! Configuration management for the booksum CLI.
//!
//! Configuration is loaded and merged from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - An optional YAML config file (`booksum.yaml`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active summarization provider ("instruct", "pipeline", "gemini")
    pub provider: String,

    /// Default model identifier
    pub model: String,

    /// API key for hosted providers
    pub api_key: Option<String>,

    /// Output language for summaries ("es" or "en")
    pub language: String,

    /// Path to the history database
    pub db_path: PathBuf,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider-specific configurations from the config file
    pub providers: Option<HashMap<String, ProviderConfig>>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    /// Hosted Gemini API configuration
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        /// Seconds to sleep between chunk requests (rate limiting)
        #[serde(rename = "requestDelay")]
        request_delay: Option<u64>,
    },

    /// Local instruction-tuned model served by a local runtime
    Instruct {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },

    /// Local generic summarization pipeline model
    Pipeline {
        endpoint: String,
        model: String,
    },
}

impl ProviderConfig {
    /// Get the model name for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } => model,
            Self::Instruct { model, .. } => model,
            Self::Pipeline { model, .. } => model,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    language: Option<String>,
    database: Option<DatabaseConfig>,
    logging: Option<LoggingConfig>,
    providers: Option<HashMap<String, ProviderConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "instruct".to_string(), // Local-first default
            model: "gemma-booksum".to_string(),
            api_key: None,
            language: "es".to_string(),
            db_path: PathBuf::from("summary_history.db"),
            log_level: None,
            verbose: false,
            no_color: false,
            providers: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `BOOKSUM_CONFIG`: Path to config file
    /// - `BOOKSUM_PROVIDER`: Summarization provider
    /// - `BOOKSUM_MODEL`: Model identifier
    /// - `BOOKSUM_API_KEY`: API key for hosted providers
    /// - `BOOKSUM_LANGUAGE`: Output language ("es" or "en")
    /// - `BOOKSUM_DB`: History database path
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("BOOKSUM_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            PathBuf::from("booksum.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("BOOKSUM_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("BOOKSUM_MODEL") {
            config.model = model;
        }

        if let Ok(language) = std::env::var("BOOKSUM_LANGUAGE") {
            config.language = language;
        }

        if let Ok(db) = std::env::var("BOOKSUM_DB") {
            config.db_path = PathBuf::from(db);
        }

        if config.api_key.is_none() {
            config.api_key = std::env::var("BOOKSUM_API_KEY").ok();
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(provider) = config_file.provider {
            result.provider = provider;
        }

        if let Some(language) = config_file.language {
            result.language = language;
        }

        if let Some(db) = config_file.database {
            if let Some(path) = db.path {
                result.db_path = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(providers) = config_file.providers {
            // Set model from the active provider entry
            if let Some(provider_config) = providers.get(&result.provider) {
                result.model = provider_config.model().to_string();
            }
            result.providers = Some(providers);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        language: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> AppResult<Self> {
        // A config file named on the command line is merged first so the
        // remaining flags still win over its contents.
        if let Some(config_file) = config_file {
            self = self.merge_yaml(&config_file)?;
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(language) = language {
            self.language = language;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        Ok(self)
    }

    /// Get the configuration entry for a provider, if the config file has one.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.providers
            .as_ref()
            .and_then(|p| p.get(provider).cloned())
    }

    /// Resolve the API key for a hosted provider.
    ///
    /// `BOOKSUM_API_KEY` (or `--api-key`) wins; otherwise the environment
    /// variable named by the provider's `apiKeyEnv` entry is consulted.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::Gemini { api_key_env, .. }) =
            self.get_provider_config(provider)
        {
            if let Ok(key) = std::env::var(&api_key_env) {
                return Some(key);
            }
        }

        None
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = &self.provider;
        let known_providers = ["instruct", "pipeline", "gemini"];

        if !known_providers.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                known_providers.join(", ")
            )));
        }

        if !matches!(self.language.as_str(), "es" | "en") {
            return Err(AppError::Config(format!(
                "Unknown language: {}. Supported: es, en",
                self.language
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "instruct");
        assert_eq!(config.language, "es");
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            Some("gemini".to_string()),
            Some("gemini-2.0-flash-exp".to_string()),
            Some("en".to_string()),
            None,
            true,
            false,
        )
        .unwrap();

        assert_eq!(overridden.provider, "gemini");
        assert_eq!(overridden.model, "gemini-2.0-flash-exp");
        assert_eq!(overridden.language, "en");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_language() {
        let mut config = AppConfig::default();
        config.language = "fr".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_api_key_explicit() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.resolve_api_key("gemini"), Some("sk-test".to_string()));
    }
}
