use crate::gateway::HttpBackendConfig;
use std::collections::HashSet;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible configuration: {reason}")]
    IncompatibleConfig { reason: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Main relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the OpenAI-compatible completion API
    pub base_url: String,
    /// Bearer token for the completion API
    pub api_key: Option<String>,
    /// Sent upstream as `HTTP-Referer`
    pub referer: Option<String>,
    /// Sent upstream as `X-Title`
    pub title: Option<String>,
    /// Models raced against each other, in order
    pub candidate_models: Vec<String>,
    /// Model used to review the winning reply
    pub guardian_model: String,
    /// Skip the guardian review entirely
    pub disable_guardian: bool,
    /// Overall wall-clock bound for one race, in seconds
    pub race_timeout_secs: u64,
    /// Transport timeout for a single upstream request, in seconds
    pub request_timeout_secs: u64,
    /// Conversation history cap
    pub max_history: usize,
    /// Max tokens requested from candidates
    pub max_tokens: Option<u32>,
    pub candidate_temperature: f32,
    pub guardian_temperature: f32,
    /// Log level (None = info)
    pub log_level: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            referer: None,
            title: None,
            candidate_models: vec![
                "deepseek/deepseek-r1-0528-qwen3-8b:free".to_string(),
                "mistralai/mistral-7b-instruct:free".to_string(),
                "meta-llama/llama-3.3-8b-instruct:free".to_string(),
            ],
            guardian_model: "google/gemma-3-12b-it:free".to_string(),
            disable_guardian: false,
            race_timeout_secs: 10,
            request_timeout_secs: 60,
            max_history: crate::conversation::DEFAULT_MAX_HISTORY,
            max_tokens: Some(1024),
            candidate_temperature: 0.7,
            guardian_temperature: crate::guardian::DEFAULT_GUARDIAN_TEMPERATURE,
            log_level: None,
        }
    }
}

impl RelayConfig {
    pub fn race_timeout(&self) -> Duration {
        Duration::from_secs(self.race_timeout_secs)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate(self)
    }

    /// Settings for the HTTP completion backend. Call after `validate`.
    pub fn backend_config(&self) -> ConfigResult<HttpBackendConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "api_key (OPENROUTER_API_KEY)".to_string(),
            })?;
        Ok(HttpBackendConfig {
            base_url: self.base_url.clone(),
            api_key,
            referer: self.referer.clone(),
            title: self.title.clone(),
            request_timeout_secs: self.request_timeout_secs,
        })
    }
}

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &RelayConfig) -> ConfigResult<()> {
        config.backend_config()?;
        Self::validate_models(config)?;
        Self::validate_server_settings(config)?;
        Self::validate_sampling(config)?;
        Ok(())
    }

    fn validate_models(config: &RelayConfig) -> ConfigResult<()> {
        if config.candidate_models.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "candidate_models".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for model in &config.candidate_models {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "candidate_models".to_string(),
                    value: format!("{:?}", model),
                    reason: "Model id must not be empty".to_string(),
                });
            }
            if !seen.insert(model.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "candidate_models".to_string(),
                    value: model.clone(),
                    reason: "Duplicate candidate model".to_string(),
                });
            }
        }

        if config.guardian_model.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "guardian_model".to_string(),
            });
        }
        if seen.contains(config.guardian_model.as_str()) {
            return Err(ConfigError::IncompatibleConfig {
                reason: format!(
                    "Guardian model {} must not also be a candidate",
                    config.guardian_model
                ),
            });
        }
        Ok(())
    }

    fn validate_server_settings(config: &RelayConfig) -> ConfigResult<()> {
        if config.race_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "race_timeout_secs".to_string(),
                value: config.race_timeout_secs.to_string(),
                reason: "Must be > 0".to_string(),
            });
        }
        if config.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                value: config.request_timeout_secs.to_string(),
                reason: "Must be > 0".to_string(),
            });
        }
        if config.max_history < 2 {
            return Err(ConfigError::InvalidValue {
                field: "max_history".to_string(),
                value: config.max_history.to_string(),
                reason: "Must hold at least one user and one assistant turn".to_string(),
            });
        }
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "base_url".to_string(),
            });
        }
        Ok(())
    }

    fn validate_sampling(config: &RelayConfig) -> ConfigResult<()> {
        for (field, value) in [
            ("candidate_temperature", config.candidate_temperature),
            ("guardian_temperature", config.guardian_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "Must be between 0.0 and 2.0".to_string(),
                });
            }
        }
        if config.max_tokens == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_tokens".to_string(),
                value: "0".to_string(),
                reason: "Must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
