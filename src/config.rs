//! Configuration management for the PDF OCR server
//!
//! Everything is read once at start-up. The OCR credentials have no
//! built-in fallback: a missing key or endpoint refuses to start.

use std::env;
use std::time::Duration;

/// Path of the Read API analyze operation, relative to the endpoint
pub const READ_ANALYZE_PATH: &str = "vision/v3.2/read/analyze";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a request body, in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Cognitive Services endpoint, e.g. `https://myres.cognitiveservices.azure.com/`
    pub endpoint: String,
    pub subscription_key: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// Run the jobs of one request concurrently instead of one after another
    pub concurrent_jobs: bool,
}

impl OcrConfig {
    /// Full URL of the analyze operation
    pub fn analyze_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), READ_ANALYZE_PATH)
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "SERVER_PORT", DEFAULT_PORT)?,
                max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            ocr: OcrConfig {
                endpoint: required("OCR_ENDPOINT")?,
                subscription_key: required("OCR_SUBSCRIPTION_KEY")?,
                poll_interval: Duration::from_millis(parse_or(
                    &lookup,
                    "OCR_POLL_INTERVAL_MS",
                    DEFAULT_POLL_INTERVAL_MS,
                )?),
                max_poll_attempts: parse_or(&lookup, "OCR_MAX_POLL_ATTEMPTS", DEFAULT_MAX_POLL_ATTEMPTS)?,
                concurrent_jobs: parse_or(&lookup, "OCR_CONCURRENT_JOBS", false)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
