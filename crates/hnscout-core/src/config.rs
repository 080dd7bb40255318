use std::env::VarError;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::app_config::{
    AppConfig, Environment, HnSettings, LlmProvider, LlmSettings, StoreBackend,
};
use crate::thresholds::DetectionThresholds;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("HNSCOUT_ENV", "development"))?;
    let store = parse_store_backend(&or_default("HNSCOUT_STORE", "postgres"))?;

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.is_empty());
    if store == StoreBackend::Postgres && database_url.is_none() {
        return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }

    let bind_addr: SocketAddr = parse_value(&lookup, "HNSCOUT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("HNSCOUT_LOG_LEVEL", "info");

    let hn = HnSettings {
        base_url: or_default(
            "HNSCOUT_HN_BASE_URL",
            "https://hacker-news.firebaseio.com/v0",
        ),
        request_timeout_secs: parse_value(&lookup, "HNSCOUT_HN_REQUEST_TIMEOUT_SECS", "30")?,
        inter_request_delay_ms: parse_value(&lookup, "HNSCOUT_HN_INTER_REQUEST_DELAY_MS", "50")?,
        show_limit: parse_value(&lookup, "HNSCOUT_HN_SHOW_LIMIT", "200")?,
        top_limit: parse_value(&lookup, "HNSCOUT_HN_TOP_LIMIT", "200")?,
    };

    let llm = LlmSettings {
        provider: parse_llm_provider(&or_default("HNSCOUT_LLM_PROVIDER", "openai"))?,
        base_url: or_default("HNSCOUT_LLM_BASE_URL", "https://api.openai.com/v1"),
        api_key: lookup("HNSCOUT_LLM_API_KEY").ok().filter(|s| !s.is_empty()),
        model: or_default("HNSCOUT_LLM_MODEL", "gpt-4.1"),
        api_version: or_default("HNSCOUT_LLM_API_VERSION", "2024-12-01-preview"),
        temperature: parse_f64_in(&lookup, "HNSCOUT_LLM_TEMPERATURE", "0.3", 0.0, 2.0)?,
        max_tokens: parse_value(&lookup, "HNSCOUT_LLM_MAX_TOKENS", "800")?,
        timeout_secs: parse_nonzero(&lookup, "HNSCOUT_LLM_TIMEOUT_SECS", "60")?,
        json_mode: parse_bool(&lookup, "HNSCOUT_LLM_JSON_MODE", true)?,
    };

    let thresholds = DetectionThresholds {
        accept_threshold: parse_f64_in(&lookup, "HNSCOUT_ACCEPT_THRESHOLD", "5.0", 0.0, 10.0)?,
        candidate_min_score: parse_value(&lookup, "HNSCOUT_CANDIDATE_MIN_SCORE", "50")?,
        discussion_min_score: parse_value(
            &lookup,
            "HNSCOUT_CANDIDATE_DISCUSSION_MIN_SCORE",
            "30",
        )?,
        discussion_min_comments: parse_value(&lookup, "HNSCOUT_CANDIDATE_MIN_COMMENTS", "10")?,
        min_engagement: parse_value(&lookup, "HNSCOUT_MIN_ENGAGEMENT", "10")?,
    };

    let api_keys = or_default("HNSCOUT_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        env,
        store,
        database_url,
        bind_addr,
        log_level,
        db_max_connections: parse_value(&lookup, "HNSCOUT_DB_MAX_CONNECTIONS", "10")?,
        db_min_connections: parse_value(&lookup, "HNSCOUT_DB_MIN_CONNECTIONS", "1")?,
        db_acquire_timeout_secs: parse_value(&lookup, "HNSCOUT_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
        hn,
        llm,
        thresholds,
        lookback_days: parse_value(&lookup, "HNSCOUT_LOOKBACK_DAYS", "60")?,
        report_days: parse_value(&lookup, "HNSCOUT_REPORT_DAYS", "7")?,
        report_limit: parse_value(&lookup, "HNSCOUT_REPORT_LIMIT", "50")?,
        schedule: or_default("HNSCOUT_SCHEDULE", "0 30 2 * * *"),
        api_keys,
    })
}

/// Read `var` (or `default`) and parse it as `T`.
fn parse_value<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a finite float in `[min, max]`. Rejects `NaN` and infinities.
fn parse_f64_in<F>(
    lookup: &F,
    var: &str,
    default: &str,
    min: f64,
    max: f64,
) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let value: f64 = parse_value(lookup, var, default)?;
    if !value.is_finite() || !(min..=max).contains(&value) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a number in [{min}, {max}], got {value}"),
        });
    }
    Ok(value)
}

fn parse_nonzero<F>(lookup: &F, var: &str, default: &str) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let value: u64 = parse_value(lookup, var, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool<F>(lookup: &F, var: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let Ok(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HNSCOUT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_store_backend(s: &str) -> Result<StoreBackend, ConfigError> {
    match s {
        "postgres" => Ok(StoreBackend::Postgres),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HNSCOUT_STORE".to_string(),
            reason: format!("expected \"postgres\" or \"memory\", got \"{other}\""),
        }),
    }
}

fn parse_llm_provider(s: &str) -> Result<LlmProvider, ConfigError> {
    match s {
        "openai" => Ok(LlmProvider::OpenAi),
        "azure" => Ok(LlmProvider::Azure),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HNSCOUT_LLM_PROVIDER".to_string(),
            reason: format!("expected \"openai\" or \"azure\", got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
