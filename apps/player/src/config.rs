//! Environment configuration.

use lesson_core::PlayerSettings;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";
pub const DEFAULT_RECOGNITION_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration for the player.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub recognition_timeout: Duration,
    pub settings: PlayerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            recognition_timeout: Duration::from_secs(DEFAULT_RECOGNITION_TIMEOUT_SECS),
            settings: PlayerSettings::default(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("LESSON_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }
        config.api_token = lookup("LESSON_API_TOKEN").filter(|v| !v.trim().is_empty());

        if let Some(value) = lookup("LESSON_SIMILARITY_THRESHOLD") {
            config.settings.similarity_threshold =
                parse_threshold("LESSON_SIMILARITY_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("LESSON_RECOGNITION_TIMEOUT_SECS") {
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid {
                    key: "LESSON_RECOGNITION_TIMEOUT_SECS",
                    value,
                })?;
            config.recognition_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Similarity thresholds live in `[0, 1)`; 1.0 would make every answer wrong.
pub fn parse_threshold(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|t| (0.0..1.0).contains(t))
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
}
