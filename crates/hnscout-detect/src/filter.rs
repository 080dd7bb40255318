//! Heuristic candidate filter.
//!
//! Pure functions over [`Item`]: no I/O, no shared state beyond the compiled
//! pattern lists. The filter is tuned for recall; precision is the
//! classifier's job.

use hnscout_core::{DetectionThresholds, Item};
use regex::Regex;
use serde::Serialize;

const SHOW_HN_MARKER: &str = "show hn:";
const LAUNCH_HN_MARKER: &str = "launch hn:";

/// Title phrases that suggest a founder announcing something. Matched
/// case-insensitively as substrings.
pub const STARTUP_KEYWORDS: &[&str] = &[
    "Launch HN:",
    "startup",
    "founder",
    "co-founder",
    "we built",
    "we launched",
    "introducing",
    "announcing",
    "YC",
    "Y Combinator",
    "funding",
    "raised",
    "seed round",
    "Series A",
    "MVP",
    "beta",
    "early access",
    "waitlist",
];

const POSITIVE_URL_PATTERNS: &[&str] = &[
    r"producthunt\.com",
    r"techcrunch\.com",
    r"ycombinator\.com",
    r"github\.com/.*launch",
    r".*\.ai/?$",
    r".*app\.com",
    r".*\.io/?$",
];

const NEGATIVE_URL_PATTERNS: &[&str] = &[
    r"wikipedia\.org",
    r"arxiv\.org",
    r"medium\.com",
    r"reddit\.com",
    r"twitter\.com",
    r"youtube\.com",
];

const KEYWORD_WEIGHT: f64 = 0.2;
const SHOW_HN_BONUS: f64 = 0.3;
const POSITIVE_URL_WEIGHT: f64 = 0.1;
const NEGATIVE_URL_PENALTY: f64 = 0.3;
const ENGAGEMENT_BONUS: f64 = 0.1;
const HIGH_ENGAGEMENT_SCORE: i64 = 50;
const ACTIVE_DISCUSSION_COMMENTS: i64 = 20;

const FUNDING_TERMS: &[&str] = &[
    "raised", "funding", "seed", "series a", "series b", "$m", "$k",
];
const YC_TERMS: &[&str] = &["yc", "y combinator", "ycombinator"];
const FOUNDER_TERMS: &[&str] = &[
    "we built",
    "we launched",
    "our startup",
    "i built",
    "i launched",
];
const DISCUSSION_HOSTS: &[&str] = &["ycombinator.com", "reddit.com", "medium.com"];

/// Advisory startup-likelihood score for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSignal {
    /// Clamped to `[0.0, 1.0]`.
    pub score: f64,
    /// Human-readable contributions, in the order they were applied.
    pub reasons: Vec<String>,
}

/// Boolean hints extracted from the title and URL, shown alongside a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupSignals {
    pub is_show_hn: bool,
    pub is_launch_hn: bool,
    pub mentions_funding: bool,
    pub mentions_yc: bool,
    pub founder_post: bool,
    pub has_product_url: bool,
}

/// An item admitted to classification, with its advisory annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item: Item,
    pub signal: CandidateSignal,
    pub signals: StartupSignals,
}

/// Keyword and URL-pattern scorer plus the engagement gate.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    positive: Vec<Regex>,
    negative: Vec<Regex>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateFilter {
    #[must_use]
    pub fn new() -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid regex"))
                .collect()
        };
        Self {
            positive: compile(POSITIVE_URL_PATTERNS),
            negative: compile(NEGATIVE_URL_PATTERNS),
        }
    }

    /// Score an item in `[0.0, 1.0]` with the reasons behind it.
    ///
    /// Each vocabulary keyword found in the title adds 0.2, a title starting
    /// with `Show HN:` adds 0.3, the first matching product-style URL pattern
    /// adds 0.1 and the first matching reference/social URL pattern subtracts
    /// 0.3. Score ≥ 50 and ≥ 20 comments add 0.1 each.
    #[must_use]
    pub fn score(&self, item: &Item) -> CandidateSignal {
        let mut score = 0.0_f64;
        let mut reasons = Vec::new();

        let title = item.title.to_lowercase();
        for keyword in STARTUP_KEYWORDS {
            if title.contains(&keyword.to_lowercase()) {
                score += KEYWORD_WEIGHT;
                reasons.push(format!("title contains '{keyword}'"));
            }
        }

        if title.starts_with(SHOW_HN_MARKER) {
            score += SHOW_HN_BONUS;
            reasons.push("Show HN post".to_string());
        }

        if let Some(url) = item.url.as_deref().filter(|u| !u.is_empty()) {
            let url = url.to_lowercase();
            if let Some(re) = self.positive.iter().find(|re| re.is_match(&url)) {
                score += POSITIVE_URL_WEIGHT;
                reasons.push(format!("URL matches startup pattern: {}", re.as_str()));
            }
            if let Some(re) = self.negative.iter().find(|re| re.is_match(&url)) {
                score -= NEGATIVE_URL_PENALTY;
                reasons.push(format!("URL matches non-startup pattern: {}", re.as_str()));
            }
        }

        if item.score >= HIGH_ENGAGEMENT_SCORE {
            score += ENGAGEMENT_BONUS;
            reasons.push("high engagement".to_string());
        }
        if item.comments >= ACTIVE_DISCUSSION_COMMENTS {
            score += ENGAGEMENT_BONUS;
            reasons.push("active discussion".to_string());
        }

        CandidateSignal {
            score: score.clamp(0.0, 1.0),
            reasons,
        }
    }

    /// Whether an item passes the candidate gate.
    ///
    /// Show HN posts always pass; otherwise the item needs a high score, or a
    /// moderate score together with an active comment thread.
    #[must_use]
    pub fn is_candidate(item: &Item, thresholds: &DetectionThresholds) -> bool {
        item.title.to_lowercase().contains(SHOW_HN_MARKER)
            || item.score >= thresholds.candidate_min_score
            || (item.score >= thresholds.discussion_min_score
                && item.comments >= thresholds.discussion_min_comments)
    }

    /// Select candidates from `items`, preserving input order.
    ///
    /// The attached score is advisory and never rejects an item on its own.
    #[must_use]
    pub fn filter(&self, items: &[Item], thresholds: &DetectionThresholds) -> Vec<Candidate> {
        items
            .iter()
            .filter(|item| Self::is_candidate(item, thresholds))
            .map(|item| Candidate {
                signal: self.score(item),
                signals: signals(item),
                item: item.clone(),
            })
            .collect()
    }
}

/// Extract display hints from an item's title and URL.
#[must_use]
pub fn signals(item: &Item) -> StartupSignals {
    let title = item.title.to_lowercase();
    let contains_any = |terms: &[&str]| terms.iter().any(|t| title.contains(t));

    StartupSignals {
        is_show_hn: title.starts_with(SHOW_HN_MARKER),
        is_launch_hn: title.starts_with(LAUNCH_HN_MARKER),
        mentions_funding: contains_any(FUNDING_TERMS),
        mentions_yc: contains_any(YC_TERMS),
        founder_post: contains_any(FOUNDER_TERMS),
        has_product_url: item
            .url
            .as_deref()
            .is_some_and(|u| !u.is_empty() && !DISCUSSION_HOSTS.iter().any(|h| u.contains(h))),
    }
}
