pub mod app_config;
pub mod config;
pub mod items;
pub mod records;
pub mod thresholds;
pub mod verdict;

pub use app_config::{AppConfig, Environment, HnSettings, LlmProvider, LlmSettings, StoreBackend};
pub use config::{load_app_config, load_app_config_from_env};
pub use items::{Item, HN_WEB_BASE};
pub use records::{
    DiscoveryRecord, ProcessedRecord, RunMode, RunRecord, RunStatus, StoredDiscovery, StoredRun,
};
pub use thresholds::DetectionThresholds;
pub use verdict::{ItemKind, Verdict};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
