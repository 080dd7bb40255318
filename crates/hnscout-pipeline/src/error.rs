use hnscout_db::DbError;
use hnscout_hn::HnError;
use thiserror::Error;

/// Conditions that abort a whole run.
///
/// Per-item failures never surface here; they are counted in the run summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("state store unavailable: {0}")]
    Store(#[from] DbError),

    #[error("content fetch failed: {0}")]
    Fetch(#[from] HnError),
}
