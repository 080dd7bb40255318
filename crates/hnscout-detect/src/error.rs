use thiserror::Error;

/// Why a classification attempt produced no verdict.
///
/// Every variant is a per-item failure: the orchestrator logs it and leaves
/// the item unprocessed so a later run reconsiders it.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no API key configured for the classifier backend")]
    MissingApiKey,

    #[error("invalid classifier base URL \"{0}\"")]
    InvalidBaseUrl(String),

    /// Connection, TLS, or body-read failure.
    #[error("classifier transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("classifier call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Non-2xx response from the backend.
    #[error("classifier API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The backend answered but the content is not a usable JSON object.
    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),
}
