use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://jobSearchTracker.db";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Optional at load time; its absence is reported when the extractor is built.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub fetch_timeout: Duration,
    pub extraction_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_model: non_empty("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            fetch_timeout: seconds(
                non_empty("FETCH_TIMEOUT_SECS"),
                DEFAULT_FETCH_TIMEOUT_SECS,
            )
            .context("FETCH_TIMEOUT_SECS must be a positive number of seconds")?,
            extraction_timeout: seconds(
                non_empty("EXTRACTION_TIMEOUT_SECS"),
                DEFAULT_EXTRACTION_TIMEOUT_SECS,
            )
            .context("EXTRACTION_TIMEOUT_SECS must be a positive number of seconds")?,
        })
    }
}

fn seconds(raw: Option<String>, default: u64) -> Result<Duration> {
    let secs = match raw {
        Some(value) => value.trim().parse::<u64>()?,
        None => default,
    };
    anyhow::ensure!(secs > 0, "timeout must be greater than zero");
    Ok(Duration::from_secs(secs))
}
