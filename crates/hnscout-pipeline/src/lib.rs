//! Discovery pipeline: fetch, filter, classify, persist.
//!
//! [`Pipeline`] owns no I/O handles of its own. The caller injects the
//! [`hnscout_db::StateStore`], the [`hnscout_detect::Classifier`], and a
//! [`ContentSource`] per run, and owns their lifecycles.

pub mod error;
pub mod orchestrator;
pub mod runs;
pub mod snapshot;
pub mod source;

pub use error::PipelineError;
pub use orchestrator::{ItemOutcome, Pipeline, RunSummary};
pub use runs::RunReport;
pub use snapshot::{build_snapshot, DiscoverySummary, ReportMetadata, ReportSnapshot};
pub use source::ContentSource;
