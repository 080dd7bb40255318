//! Hacker News Firebase API client.
//!
//! Lists story ids per category, fetches individual items, and collects the
//! stories created inside a time window. Individual item failures are logged
//! and skipped so one bad id never aborts a batch.

pub mod client;
pub mod error;
pub mod types;

pub use client::HnClient;
pub use error::HnError;
pub use types::{HnItem, StoryCategory};
