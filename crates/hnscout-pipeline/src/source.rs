use async_trait::async_trait;
use hnscout_core::Item;
use hnscout_hn::{HnClient, HnError};

/// Where a run gets its items from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Items created in `[start, end]` (epoch seconds). Individual item
    /// failures are the source's to skip; an error here aborts the run.
    async fn fetch_between(&self, start: i64, end: i64) -> Result<Vec<Item>, HnError>;
}

#[async_trait]
impl ContentSource for HnClient {
    async fn fetch_between(&self, start: i64, end: i64) -> Result<Vec<Item>, HnError> {
        self.fetch_stories_between(start, end).await
    }
}
