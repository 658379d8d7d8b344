use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::rate_limit::QuotaPolicy;

/// Where plan-generation quota counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// Shared across instances.
    Redis,
    /// Per process; counts reset on restart.
    Memory,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub plan_rate_limit: u32,
    pub plan_rate_window_secs: u64,
    pub plan_timeout_secs: u64,
    pub rate_limit_backend: RateLimitBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            plan_rate_limit: parse_env("PLAN_RATE_LIMIT", 10)?,
            plan_rate_window_secs: parse_env("PLAN_RATE_WINDOW_SECS", 3600)?,
            plan_timeout_secs: parse_env("PLAN_TIMEOUT_SECS", 90)?,
            rate_limit_backend: parse_backend(
                &std::env::var("RATE_LIMIT_BACKEND").unwrap_or_else(|_| "redis".to_string()),
            )?,
        })
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            limit: self.plan_rate_limit,
            window: Duration::from_secs(self.plan_rate_window_secs),
        }
    }

    pub fn plan_timeout(&self) -> Duration {
        Duration::from_secs(self.plan_timeout_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_backend(raw: &str) -> Result<RateLimitBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "redis" => Ok(RateLimitBackend::Redis),
        "memory" => Ok(RateLimitBackend::Memory),
        other => bail!("RATE_LIMIT_BACKEND must be 'redis' or 'memory', got '{other}'"),
    }
}
