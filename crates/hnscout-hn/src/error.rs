use thiserror::Error;

/// Errors returned by the Hacker News API client.
#[derive(Debug, Error)]
pub enum HnError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{0}\"")]
    InvalidBaseUrl(String),

    /// Every story listing failed, so there is nothing to fetch.
    #[error("no story listing could be fetched: {0}")]
    NoListings(String),
}
