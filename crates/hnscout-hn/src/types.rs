//! Hacker News API response types.

use hnscout_core::Item;
use serde::Deserialize;

/// Story listing endpoints exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryCategory {
    Top,
    New,
    Best,
    Show,
    Ask,
}

impl StoryCategory {
    /// Path segment (without `.json`) for this listing.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            StoryCategory::Top => "topstories",
            StoryCategory::New => "newstories",
            StoryCategory::Best => "beststories",
            StoryCategory::Show => "showstories",
            StoryCategory::Ask => "askstories",
        }
    }
}

/// Raw item as returned by `/item/{id}.json`.
///
/// Every field except `id` is optional in the API: comments have no title,
/// deleted items carry little more than an id.
#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub descendants: Option<i64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

impl HnItem {
    /// Convert to a domain [`Item`] if this is a live story with a title.
    #[must_use]
    pub fn into_story(self) -> Option<Item> {
        if self.deleted || self.dead || self.item_type.as_deref() != Some("story") {
            return None;
        }
        let title = self.title?;
        Some(Item {
            id: self.id,
            title,
            url: self.url.filter(|u| !u.is_empty()),
            author: self.by,
            score: self.score.unwrap_or(0),
            comments: self.descendants.unwrap_or(0),
            created_at: self.time.unwrap_or(0),
        })
    }
}
