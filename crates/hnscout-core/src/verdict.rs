//! Classification output shared by the classifier, store, and report layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a classified item turned out to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Startup,
    Innovation,
    #[default]
    Other,
}

impl ItemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Startup => "startup",
            ItemKind::Innovation => "innovation",
            ItemKind::Other => "other",
        }
    }

    /// Parse a kind label. Matching is case-insensitive and ignores
    /// surrounding whitespace; anything unrecognized is [`ItemKind::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "startup" => ItemKind::Startup,
            "innovation" => ItemKind::Innovation,
            _ => ItemKind::Other,
        }
    }

    /// `true` for the kinds that can become a discovery.
    #[must_use]
    pub fn is_discovery_kind(self) -> bool {
        matches!(self, ItemKind::Startup | ItemKind::Innovation)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated classification for one item.
///
/// Every field is populated; defaults and coercions are applied when the
/// model response is parsed, so downstream code never sees raw model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub name: String,
    pub category: String,
    pub stage: String,
    pub summary: String,
    pub key_features: Vec<String>,
    pub target_audience: String,
    pub technical_details: String,
    pub business_model: String,
    pub founder_info: String,
    pub funding_stage: String,
    pub why_interesting: String,
    /// Quality score in `[0.0, 10.0]`; gates acceptance.
    pub innovation_score: f64,
    pub coolness_factor: String,
}

impl Verdict {
    /// Whether this verdict clears `threshold` and is of a discovery kind.
    #[must_use]
    pub fn is_accepted(&self, threshold: f64) -> bool {
        self.kind.is_discovery_kind() && self.innovation_score >= threshold
    }
}
