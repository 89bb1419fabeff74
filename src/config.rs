// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets (JWT key, Gemini key) as environment variables,
//! so everything is read once at startup.

use std::env;
use std::time::Duration;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model used for suggestions.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (allowed CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Gemini REST base URL (overridable for tests)
    pub gemini_base_url: String,
    /// Gemini model name
    pub gemini_model: String,
    /// How long generated suggestions stay cached
    pub suggestion_cache_ttl: Duration,
    /// Optional endpoint for local alert delivery
    pub alert_webhook_url: Option<String>,
    /// Alert delivery attempts before giving up
    pub alert_max_attempts: u32,
    /// First alert retry delay
    pub alert_initial_delay: Duration,
    /// Upper bound for a single alert retry delay
    pub alert_max_delay: Duration,
    /// Hydration reminder poll period
    pub hydration_poll_interval: Duration,

    // --- Secrets ---
    /// JWT signing key shared with the identity provider (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Gemini API key. Without one every suggestion call uses the fallback list.
    pub gemini_api_key: Option<String>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            suggestion_cache_ttl: Duration::from_secs(60 * 60),
            alert_webhook_url: None,
            alert_max_attempts: 3,
            alert_initial_delay: Duration::from_millis(1),
            alert_max_delay: Duration::from_millis(4),
            hydration_poll_interval: Duration::from_secs(60),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            gemini_api_key: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// For local development, a `.env` file is honored.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8080)?,
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            suggestion_cache_ttl: Duration::from_secs(parse_or("SUGGESTION_CACHE_TTL_SECS", 3600)?),
            alert_webhook_url: non_empty_var("ALERT_WEBHOOK_URL"),
            alert_max_attempts: parse_or("ALERT_MAX_ATTEMPTS", 5)?,
            alert_initial_delay: Duration::from_millis(parse_or("ALERT_INITIAL_DELAY_MS", 30_000)?),
            alert_max_delay: Duration::from_millis(parse_or("ALERT_MAX_DELAY_MS", 480_000)?),
            hydration_poll_interval: Duration::from_secs(parse_or("HYDRATION_POLL_SECS", 60)?),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
        })
    }
}

/// Read a trimmed variable, treating empty values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a numeric variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("ALERT_MAX_ATTEMPTS", "7");
        env::set_var("GEMINI_API_KEY", "   ");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.alert_max_attempts, 7);
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);

        env::remove_var("ALERT_MAX_ATTEMPTS");
        env::remove_var("GEMINI_API_KEY");
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        env::set_var("FASTING_TEST_GARBAGE_PORT", "eighty");
        let result: Result<u16, _> = parse_or("FASTING_TEST_GARBAGE_PORT", 8080);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
