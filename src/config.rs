use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_TOAST_TTL_MS: u64 = 2800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of milliseconds, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HR REST API, without a trailing slash.
    pub api_base_url: String,
    pub log_dir: String,
    /// How long a success notice stays visible.
    pub toast_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_dir: DEFAULT_LOG_DIR.to_string(),
            toast_ttl: Duration::from_millis(DEFAULT_TOAST_TTL_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("HRM_API_BASE_URL")
            .or_else(|| lookup("VITE_API_BASE_URL"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let toast_ttl_ms = match lookup("HRM_TOAST_TTL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "HRM_TOAST_TTL_MS",
                    value: raw.clone(),
                })?,
            None => DEFAULT_TOAST_TTL_MS,
        };

        Ok(Self {
            api_base_url: normalize_base_url(&base),
            log_dir: lookup("HRM_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            toast_ttl: Duration::from_millis(toast_ttl_ms),
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}
