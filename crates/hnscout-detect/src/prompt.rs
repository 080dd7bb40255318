//! Versioned prompt template for story classification.

use hnscout_core::Item;

/// Bumped whenever the template text changes in a way that can shift verdicts.
pub const PROMPT_VERSION: &str = "2024-07-startup-v2";

pub const SYSTEM_PROMPT: &str = "You are an expert startup analyst. Analyze Hacker News posts \
to identify promising startups. Always respond with valid JSON.";

/// Render the user message for one story.
#[must_use]
pub fn build_user_prompt(item: &Item) -> String {
    let url = item.url.as_deref().unwrap_or("");
    format!(
        r#"Analyze this Hacker News post to determine if it's about:
1. A NEW STARTUP ANNOUNCEMENT - MUST be founders/creators announcing their own new startup/company
2. A cool technical innovation (open source project, research, algorithm, tool, etc.)
3. Neither

Post Title: {title}
URL: {url}
Score: {score} points
Comments: {comments}

IMPORTANT STARTUP CRITERIA:
- MUST be a NEW startup announcement (not news about existing companies)
- MUST be posted by founders/team members (Show HN, Launch HN, or clear founder language like "we built", "we're launching")
- NOT general news, updates, or discussions about existing companies
- NOT job postings, funding news, or company pivots
- Examples of valid startups: "Show HN: We built X", "Launch HN: Company (YC S24)", "Introducing our new startup"
- Examples to REJECT: "Company X raises funding", "Company Y's new feature", "Why Company Z failed"

Return a single JSON object with exactly these fields:
{{
    "type": "startup" | "innovation" | "other",
    "confidence": 0.0-1.0,
    "name": "project/startup/innovation name",
    "category": "e.g., AI/ML, SaaS, Developer Tools, Programming Language, Algorithm, etc.",
    "stage": "e.g., idea, MVP, launched, funded, research, experimental",
    "summary": "1-2 sentence description",
    "key_features": ["feature1", "feature2"],
    "target_audience": "who this is for",
    "technical_details": "for innovations: what makes it technically interesting",
    "business_model": "for startups: if mentioned",
    "founder_info": "any creator/founder details",
    "funding_stage": "if mentioned",
    "why_interesting": "why this is noteworthy",
    "innovation_score": 0.0-10.0,
    "coolness_factor": "what makes this cool or innovative"
}}

Rate based on:
For startups: Innovation, market potential, team quality, traction, technical merit
For innovations: Technical novelty, usefulness, elegance, performance gains, community impact

Set type="startup" ONLY for genuine new startup announcements by founders.
Set type="other" if it's just news about existing companies or not a technical innovation."#,
        title = item.title,
        score = item.score,
        comments = item.comments,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_item_fields() {
        let item = Item {
            id: 7,
            title: "Show HN: Quill".to_string(),
            url: Some("https://quill.io".to_string()),
            author: None,
            score: 88,
            comments: 14,
            created_at: 0,
        };
        let prompt = build_user_prompt(&item);
        assert!(prompt.contains("Post Title: Show HN: Quill"));
        assert!(prompt.contains("URL: https://quill.io"));
        assert!(prompt.contains("Score: 88 points"));
        assert!(prompt.contains("Comments: 14"));
        assert!(prompt.contains("\"innovation_score\": 0.0-10.0"));
    }

    #[test]
    fn missing_url_renders_empty() {
        let item = Item {
            id: 8,
            title: "Ask HN: anything".to_string(),
            url: None,
            author: None,
            score: 1,
            comments: 0,
            created_at: 0,
        };
        assert!(build_user_prompt(&item).contains("URL: \n"));
    }
}
