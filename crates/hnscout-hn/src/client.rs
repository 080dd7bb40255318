//! HTTP client for the Hacker News Firebase API.
//!
//! Wraps `reqwest` with typed decoding and a paced, failure-tolerant batch
//! fetch. There is no retry loop: an id that fails this run is simply
//! reconsidered by the next one.

use std::collections::HashSet;
use std::time::Duration;

use hnscout_core::{HnSettings, Item};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::HnError;
use crate::types::{HnItem, StoryCategory};

const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
const DEFAULT_LISTING_LIMIT: usize = 200;

/// Client for the Hacker News API.
///
/// Use [`HnClient::from_settings`] in production or [`HnClient::with_base_url`]
/// to point at a mock server in tests.
pub struct HnClient {
    client: Client,
    base_url: String,
    inter_request_delay: Duration,
    show_limit: usize,
    top_limit: usize,
}

impl HnClient {
    /// Creates a client pointed at the public API with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`HnError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, HnError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs)
    }

    /// Creates a client from the application's HN settings.
    ///
    /// # Errors
    ///
    /// Same as [`HnClient::with_base_url`].
    pub fn from_settings(settings: &HnSettings) -> Result<Self, HnError> {
        Ok(
            Self::with_base_url(&settings.base_url, settings.request_timeout_secs)?
                .with_inter_request_delay(Duration::from_millis(settings.inter_request_delay_ms))
                .with_listing_limits(settings.show_limit, settings.top_limit),
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`HnError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`HnError::InvalidBaseUrl`] if `base_url` is not an http(s) URL.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, HnError> {
        let trimmed = base_url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(HnError::InvalidBaseUrl(base_url.to_owned()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("hnscout/0.1 (startup-discovery)")
            .build()?;

        Ok(Self {
            client,
            base_url: trimmed.to_owned(),
            inter_request_delay: Duration::ZERO,
            show_limit: DEFAULT_LISTING_LIMIT,
            top_limit: DEFAULT_LISTING_LIMIT,
        })
    }

    /// Pause between consecutive item fetches in [`HnClient::fetch_stories_between`].
    #[must_use]
    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    /// Number of ids taken from the Show HN and top listings respectively.
    #[must_use]
    pub fn with_listing_limits(mut self, show_limit: usize, top_limit: usize) -> Self {
        self.show_limit = show_limit;
        self.top_limit = top_limit;
        self
    }

    /// Fetches the ordered id listing for a story category.
    ///
    /// # Errors
    ///
    /// - [`HnError::Http`] on network failure.
    /// - [`HnError::UnexpectedStatus`] on a non-2xx response.
    /// - [`HnError::Deserialize`] if the body is not an id array. A JSON
    ///   `null` body is treated as an empty listing.
    pub async fn list_ids(&self, category: StoryCategory) -> Result<Vec<i64>, HnError> {
        let url = format!("{}/{}.json", self.base_url, category.endpoint());
        let ids: Option<Vec<i64>> = self.get_json(&url, category.endpoint()).await?;
        Ok(ids.unwrap_or_default())
    }

    /// Fetches one item and returns it if it is a live story.
    ///
    /// Returns `Ok(None)` for unknown ids (JSON `null`), comments and other
    /// non-story items, and deleted or dead stories.
    ///
    /// # Errors
    ///
    /// - [`HnError::Http`] on network failure.
    /// - [`HnError::UnexpectedStatus`] on a non-2xx response.
    /// - [`HnError::Deserialize`] if the body does not match the item shape.
    pub async fn get_item(&self, id: i64) -> Result<Option<Item>, HnError> {
        let url = format!("{}/item/{id}.json", self.base_url);
        let raw: Option<HnItem> = self.get_json(&url, &format!("item(id={id})")).await?;
        Ok(raw.and_then(HnItem::into_story))
    }

    /// Collects stories created in `[start, end]` (epoch seconds).
    ///
    /// Candidates come from the first `show_limit` Show HN ids and the first
    /// `top_limit` top-story ids, de-duplicated in listing order. A listing
    /// that fails is logged and skipped; items that fail to fetch are logged
    /// and skipped. The result is sorted newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HnError::NoListings`] only when every listing request fails.
    pub async fn fetch_stories_between(&self, start: i64, end: i64) -> Result<Vec<Item>, HnError> {
        let ids = self.collect_listing_ids().await?;
        tracing::info!(
            ids = ids.len(),
            start,
            end,
            "checking stories against time window"
        );

        let mut stories = Vec::new();
        for (index, id) in ids.iter().enumerate() {
            if index > 0 && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }

            match self.get_item(*id).await {
                Ok(Some(item)) if item.created_at >= start && item.created_at <= end => {
                    stories.push(item);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(item_id = id, error = %e, "item fetch failed; skipping");
                }
            }
        }

        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(stories)
    }

    async fn collect_listing_ids(&self) -> Result<Vec<i64>, HnError> {
        let listings = [
            (StoryCategory::Show, self.show_limit),
            (StoryCategory::Top, self.top_limit),
        ];

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut failures = Vec::new();

        for (category, limit) in listings {
            match self.list_ids(category).await {
                Ok(listing) => {
                    ids.extend(
                        listing
                            .into_iter()
                            .take(limit)
                            .filter(|id| seen.insert(*id)),
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        listing = category.endpoint(),
                        error = %e,
                        "story listing fetch failed"
                    );
                    failures.push(format!("{}: {e}", category.endpoint()));
                }
            }
        }

        if failures.len() == listings.len() {
            return Err(HnError::NoListings(failures.join("; ")));
        }

        Ok(ids)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<T, HnError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HnError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| HnError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_strips_trailing_slash() {
        let client = HnClient::with_base_url("https://example.com/v0/", 5).expect("client");
        assert_eq!(client.base_url, "https://example.com/v0");
    }

    #[test]
    fn with_base_url_rejects_non_http_urls() {
        let result = HnClient::with_base_url("ftp://example.com", 5);
        assert!(matches!(result, Err(HnError::InvalidBaseUrl(_))));
    }

    #[test]
    fn from_settings_applies_limits_and_delay() {
        let settings = HnSettings {
            base_url: "http://localhost:9".to_string(),
            request_timeout_secs: 5,
            inter_request_delay_ms: 75,
            show_limit: 3,
            top_limit: 4,
        };
        let client = HnClient::from_settings(&settings).expect("client");
        assert_eq!(client.show_limit, 3);
        assert_eq!(client.top_limit, 4);
        assert_eq!(client.inter_request_delay, Duration::from_millis(75));
    }
}
