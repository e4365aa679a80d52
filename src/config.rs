//! Runtime configuration from environment variables.
//!
//! The two secrets (service endpoint, API key) have no defaults and must
//! be present. Everything else is a tuning knob with a sensible default.
//! `.env` loading happens in `main` before this module is consulted.

use std::net::SocketAddr;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "medannot";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default analysis model. `prebuilt-document` is the general
/// key-value/table/paragraph model of the Document Intelligence v3.1 API.
pub const DEFAULT_MODEL_ID: &str = "prebuilt-document";

/// API version the client pins unless overridden. v3.1 is the last
/// version that ships `prebuilt-document`.
pub const DEFAULT_API_VERSION: &str = "2023-07-31";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8570";

/// Fixed inter-request delay for multi-file uploads, in milliseconds.
/// The free service tier caps at 15 requests/minute; 6 s between calls
/// stays under it without an adaptive scheme.
const DEFAULT_BATCH_DELAY_MS: u64 = 6_000;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default `RUST_LOG` filter when the variable is unset.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,tower_http=info")
}

/// Service configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Document-analysis service endpoint (secret #1).
    pub endpoint: String,
    /// Subscription key for the service (secret #2).
    pub api_key: String,
    pub model_id: String,
    pub api_version: String,
    pub bind_addr: SocketAddr,
    pub batch_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    /// `from_env` delegates here; tests supply a closure instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = require(&lookup, "MEDANNOT_ENDPOINT")?;
        let api_key = require(&lookup, "MEDANNOT_API_KEY")?;
        let model_id =
            lookup("MEDANNOT_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        let api_version =
            lookup("MEDANNOT_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let bind_addr: SocketAddr = parse_or(&lookup, "MEDANNOT_BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let batch_delay_ms = parse_num(&lookup, "MEDANNOT_BATCH_DELAY_MS", DEFAULT_BATCH_DELAY_MS)?;
        let poll_interval_ms =
            parse_num(&lookup, "MEDANNOT_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        let poll_timeout_secs =
            parse_num(&lookup, "MEDANNOT_POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?;
        let request_timeout_secs = parse_num(
            &lookup,
            "MEDANNOT_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            endpoint,
            api_key,
            model_id,
            api_version,
            bind_addr,
            batch_delay_ms,
            poll_interval_ms,
            poll_timeout_secs,
            request_timeout_secs,
        })
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn require<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}

fn parse_num<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidVar { var, value: raw })
}

/// Errors from configuration resolution. Each names the offending
/// variable so the fix is obvious from the log line.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for {var}: '{value}'")]
    InvalidVar { var: &'static str, value: String },
}
