use std::net::SocketAddr;

use crate::thresholds::DetectionThresholds;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which state store implementation backs the pipeline and the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Wire dialect of the chat-completions backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// `{base}/chat/completions` with `Authorization: Bearer`.
    OpenAi,
    /// `{base}/openai/deployments/{model}/chat/completions?api-version=..`
    /// with an `api-key` header.
    Azure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HnSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub show_limit: usize,
    pub top_limit: usize,
}

#[derive(Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub api_version: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub json_mode: bool,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("json_mode", &self.json_mode)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub store: StoreBackend,
    /// Required when `store` is [`StoreBackend::Postgres`].
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub hn: HnSettings,
    pub llm: LlmSettings,
    pub thresholds: DetectionThresholds,
    pub lookback_days: u32,
    pub report_days: u32,
    pub report_limit: u32,
    /// Six-field cron expression (with seconds) for the daily run.
    pub schedule: String,
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("store", &self.store)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("hn", &self.hn)
            .field("llm", &self.llm)
            .field("thresholds", &self.thresholds)
            .field("lookback_days", &self.lookback_days)
            .field("report_days", &self.report_days)
            .field("report_limit", &self.report_limit)
            .field("schedule", &self.schedule)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
