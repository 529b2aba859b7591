//! Configuration management for Chatai
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChataiError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Chatai
///
/// Holds everything the client needs to reach the assistant API, persist the
/// session credential, and resolve the device location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session credential persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Geolocation and reverse geocoding
    #[serde(default)]
    pub location: LocationConfig,

    /// Chat list behavior
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the assistant backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://server-test-steel.vercel.app".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_api_timeout(),
        }
    }
}

/// Session credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Keyring service name the credential is stored under
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyring user name the credential is stored under
    #[serde(default = "default_keyring_user")]
    pub keyring_user: String,

    /// Days a freshly issued credential stays valid locally
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

fn default_keyring_service() -> String {
    "chatai".to_string()
}

fn default_keyring_user() -> String {
    "session".to_string()
}

fn default_token_ttl_days() -> i64 {
    7
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keyring_service: default_keyring_service(),
            keyring_user: default_keyring_user(),
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

/// Location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Base URL of the OpenCage-compatible reverse geocoder
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,

    /// API key for the geocoder; reverse geocoding is skipped when absent
    #[serde(default)]
    pub geocoder_api_key: Option<String>,

    /// How long to wait for a position fix (seconds)
    #[serde(default = "default_location_timeout")]
    pub timeout_seconds: u64,
}

fn default_geocoder_url() -> String {
    "https://api.opencagedata.com".to_string()
}

fn default_location_timeout() -> u64 {
    10
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geocoder_url: default_geocoder_url(),
            geocoder_api_key: None,
            timeout_seconds: default_location_timeout(),
        }
    }
}

/// Chat list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Characters of the first user message kept in a default title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_title_max_chars() -> usize {
    crate::chat::DEFAULT_TITLE_MAX_CHARS
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            title_max_chars: default_title_max_chars(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChataiError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChataiError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("CHATAI_API_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("CHATAI_API_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CHATAI_API_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(geocoder_url) = std::env::var("CHATAI_GEOCODER_URL") {
            self.location.geocoder_url = geocoder_url;
        }

        if let Ok(key) = std::env::var("CHATAI_GEOCODER_API_KEY") {
            if !key.is_empty() {
                self.location.geocoder_api_key = Some(key);
            }
        }

        if let Ok(timeout) = std::env::var("CHATAI_LOCATION_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.location.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CHATAI_LOCATION_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_url) = &cli.api_url {
            tracing::debug!(api_url = %api_url, "CLI override: --api-url");
            self.api.base_url = api_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        validate_http_url("api.base_url", &self.api.base_url)?;
        validate_http_url("location.geocoder_url", &self.location.geocoder_url)?;

        if self.api.timeout_seconds == 0 {
            return Err(ChataiError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.location.timeout_seconds == 0 {
            return Err(ChataiError::Config(
                "location.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.keyring_service.is_empty() || self.session.keyring_user.is_empty() {
            return Err(ChataiError::Config(
                "session keyring service and user cannot be empty".to_string(),
            )
            .into());
        }

        if self.session.token_ttl_days <= 0 {
            return Err(ChataiError::Config(
                "session.token_ttl_days must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.title_max_chars == 0 {
            return Err(ChataiError::Config(
                "chat.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ChataiError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ChataiError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))
        .into()),
    }
}
