//! Performer configuration
//!
//! Settings are read from a TOML file where every field has a default. The
//! computation credential and endpoint never live in the file: the file names
//! the environment variables that carry them, and [`ComputationEnv::from_env`]
//! captures their values once at startup. Nothing downstream reads the
//! environment again.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Top-level performer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformerConfig {
    #[serde(default)]
    pub computation: ComputationSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub screen: ScreenSection,
}

/// Downstream computation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComputationSection {
    /// Environment variable containing the access credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Environment variable containing the endpoint URL
    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: String,
    /// Outbound call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ComputationSection {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            endpoint_env: default_endpoint_env(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Size ceilings applied by the validators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsSection {
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    #[serde(default = "default_max_result_bytes")]
    pub max_result_bytes: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_payload_bytes: default_max_payload_bytes(),
            max_result_bytes: default_max_result_bytes(),
        }
    }
}

/// Content screen settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScreenSection {
    /// Patterns appended after the built-in denylist
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}

fn default_api_key_env() -> String {
    "AZURE_OPENAI_KEY".to_string()
}

fn default_endpoint_env() -> String {
    "AZURE_OPENAI_ENDPOINT".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_output_tokens() -> u32 {
    64
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_payload_bytes() -> usize {
    4096 // 4KB
}

fn default_max_result_bytes() -> usize {
    8192 // 8KB
}

/// Configuration file loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Missing or malformed downstream computation settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("computation credential not set (environment variable {var})")]
    MissingCredential { var: String },
    #[error("computation endpoint not set (environment variable {var})")]
    MissingEndpoint { var: String },
    #[error("computation endpoint is not a valid URL: {reason}")]
    InvalidEndpoint { reason: String },
    #[error("computation endpoint must use HTTPS, got scheme '{scheme}'")]
    InsecureEndpoint { scheme: String },
}

impl PerformerConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PerformerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let computation = &self.computation;
        if computation.api_key_env.trim().is_empty() || computation.endpoint_env.trim().is_empty()
        {
            return Err(ConfigError::InvalidConfig(
                "computation.api_key_env and computation.endpoint_env must name environment variables"
                    .to_string(),
            ));
        }
        if computation.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "computation.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if computation.max_output_tokens == 0 {
            return Err(ConfigError::InvalidConfig(
                "computation.max_output_tokens must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&computation.temperature) {
            return Err(ConfigError::InvalidConfig(format!(
                "computation.temperature {} is outside 0.0..=2.0",
                computation.temperature
            )));
        }
        if self.limits.max_payload_bytes == 0 || self.limits.max_result_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "limits must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl ComputationSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Credential and endpoint values captured from the environment
///
/// Empty values count as absent.
#[derive(Clone, PartialEq, Eq)]
pub struct ComputationEnv {
    credential_var: String,
    endpoint_var: String,
    credential: Option<String>,
    endpoint: Option<String>,
}

impl std::fmt::Debug for ComputationEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationEnv")
            .field("credential_var", &self.credential_var)
            .field("endpoint_var", &self.endpoint_var)
            .field("credential", &self.credential.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ComputationEnv {
    pub fn new(
        section: &ComputationSection,
        credential: Option<String>,
        endpoint: Option<String>,
    ) -> Self {
        Self {
            credential_var: section.api_key_env.clone(),
            endpoint_var: section.endpoint_env.clone(),
            credential: credential.filter(|value| !value.is_empty()),
            endpoint: endpoint.filter(|value| !value.is_empty()),
        }
    }

    /// Capture the variables named by the section from the process environment
    pub fn from_env(section: &ComputationSection) -> Self {
        Self::new(
            section,
            std::env::var(&section.api_key_env).ok(),
            std::env::var(&section.endpoint_env).ok(),
        )
    }

    /// Check presence of both values and that the endpoint is HTTPS
    pub fn verify(&self) -> Result<(), ConfigurationError> {
        self.credential_and_endpoint().map(|_| ())
    }

    fn credential_and_endpoint(&self) -> Result<(&str, Url), ConfigurationError> {
        let credential =
            self.credential
                .as_deref()
                .ok_or_else(|| ConfigurationError::MissingCredential {
                    var: self.credential_var.clone(),
                })?;
        let endpoint =
            self.endpoint
                .as_deref()
                .ok_or_else(|| ConfigurationError::MissingEndpoint {
                    var: self.endpoint_var.clone(),
                })?;

        let url = Url::parse(endpoint).map_err(|e| ConfigurationError::InvalidEndpoint {
            reason: e.to_string(),
        })?;
        if url.scheme() != "https" {
            return Err(ConfigurationError::InsecureEndpoint {
                scheme: url.scheme().to_string(),
            });
        }

        Ok((credential, url))
    }
}

/// Explicit settings handed to the dispatcher constructor
#[derive(Clone)]
pub struct DispatchConfig {
    pub credential: String,
    pub endpoint: Url,
    pub timeout: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl std::fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("credential", &"***")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl DispatchConfig {
    /// Build dispatcher settings from the file section and captured environment
    pub fn resolve(
        section: &ComputationSection,
        env: &ComputationEnv,
    ) -> Result<Self, ConfigurationError> {
        let (credential, endpoint) = env.credential_and_endpoint()?;
        Ok(Self {
            credential: credential.to_string(),
            endpoint,
            timeout: section.timeout(),
            max_output_tokens: section.max_output_tokens,
            temperature: section.temperature,
        })
    }
}
