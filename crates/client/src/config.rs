//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFRONT_API_URL` - Base URL of the shop REST API
//!
//! ## Optional
//! - `SHOPFRONT_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `SHOPFRONT_STORAGE_FILE` - Path of the persisted key-value store
//!   (default: shopfront-storage.json)
//! - `SHOPFRONT_LOCALE` - Fallback display locale (default: en)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use shopfront_core::Locale;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shopfront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the external shop REST API.
    pub api_url: Url,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// File backing the persistent key-value store.
    pub storage_file: PathBuf,
    /// Locale used before any account locale is known.
    pub locale: Locale,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url("SHOPFRONT_API_URL", &get_required_env("SHOPFRONT_API_URL")?)?;

        let http_timeout = get_env_or_default("SHOPFRONT_HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPFRONT_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let storage_file =
            PathBuf::from(get_env_or_default("SHOPFRONT_STORAGE_FILE", "shopfront-storage.json"));

        let locale = get_env_or_default("SHOPFRONT_LOCALE", "en")
            .parse::<Locale>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPFRONT_LOCALE".to_string(), e))?;

        Ok(Self {
            api_url,
            http_timeout,
            storage_file,
            locale,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and sanity-check the API base URL.
fn parse_api_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }

    Ok(url)
}
