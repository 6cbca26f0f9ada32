use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::refinement::{RefinementConfig, RegressionPolicy};

/// Worker configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub rust_log: String,
    pub db_max_connections: u32,
    pub poll_interval: Duration,
    pub inter_item_delay: Duration,
    /// A `processing` job with no progress for this long is reclaimed.
    pub job_stale_after: Duration,
    /// Fact-check lookups are skipped when unset.
    pub reference_search_url: Option<String>,
    pub refinement: RefinementConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = RefinementConfig::default();
        let regression_policy = match optional_env::<u32>("REGRESSION_TOLERANCE")? {
            Some(tolerance) => RegressionPolicy::AcceptWithin { tolerance },
            None => RegressionPolicy::Revert,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            poll_interval: Duration::from_secs(env_or("POLL_INTERVAL_SECS", 5)?),
            inter_item_delay: Duration::from_millis(env_or("INTER_ITEM_DELAY_MS", 2000)?),
            job_stale_after: Duration::from_secs(env_or("JOB_STALE_AFTER_SECS", 1800)?),
            reference_search_url: std::env::var("REFERENCE_SEARCH_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            refinement: RefinementConfig {
                target_overall: env_or("TARGET_OVERALL", defaults.target_overall)?,
                max_iterations: env_or("MAX_ITERATIONS", defaults.max_iterations)?,
                cost_budget_usd: env_or("COST_BUDGET_USD", defaults.cost_budget_usd)?,
                generation_timeout: Duration::from_secs(env_or(
                    "GENERATION_TIMEOUT_SECS",
                    defaults.generation_timeout.as_secs(),
                )?),
                max_rewrite_tokens: env_or("MAX_REWRITE_TOKENS", defaults.max_rewrite_tokens)?,
                regression_policy,
                ..defaults
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(None),
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(optional_env(key)?.unwrap_or(default))
}
