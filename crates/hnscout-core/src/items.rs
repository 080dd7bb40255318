use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public web base for Hacker News discussion links.
pub const HN_WEB_BASE: &str = "https://news.ycombinator.com";

/// A story fetched from the content API.
///
/// Identity is the source-assigned `id`. Engagement fields (`score`,
/// `comments`) may change upstream but are captured once at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    pub author: Option<String>,
    /// Upvote score at fetch time.
    pub score: i64,
    /// Total comment count (`descendants` in the HN API).
    pub comments: i64,
    /// Creation time in seconds since the Unix epoch.
    pub created_at: i64,
}

impl Item {
    /// Link to the item's discussion page.
    #[must_use]
    pub fn hn_url(&self) -> String {
        format!("{HN_WEB_BASE}/item?id={}", self.id)
    }

    /// Creation time as a UTC timestamp, `None` if out of range.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }
}
