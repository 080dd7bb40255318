/// Tunable gates for candidate selection and acceptance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    /// Minimum `innovation_score` for a startup/innovation verdict to be accepted.
    pub accept_threshold: f64,
    /// Engagement score that alone makes an item a candidate.
    pub candidate_min_score: i64,
    /// Engagement score that makes an item a candidate when paired with
    /// at least `discussion_min_comments` comments.
    pub discussion_min_score: i64,
    pub discussion_min_comments: i64,
    /// Floor applied to fetched items before candidate filtering.
    pub min_engagement: i64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            accept_threshold: 5.0,
            candidate_min_score: 50,
            discussion_min_score: 30,
            discussion_min_comments: 10,
            min_engagement: 10,
        }
    }
}
