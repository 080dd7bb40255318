//! Startup and innovation detection for Hacker News stories.
//!
//! Two stages: a near-free heuristic [`CandidateFilter`] that decides which
//! stories deserve a model call, and a [`Classifier`] that turns one story
//! into a validated [`hnscout_core::Verdict`]. The LLM-backed classifier
//! speaks the OpenAI chat-completions dialect (plain or Azure-hosted).

pub mod chat;
pub mod classifier;
pub mod error;
pub mod filter;
pub mod parse;
pub mod prompt;

pub use chat::ChatClient;
pub use classifier::{Classifier, LlmClassifier};
pub use error::ClassifyError;
pub use filter::{signals, Candidate, CandidateFilter, CandidateSignal, StartupSignals};
pub use parse::parse_verdict;
pub use prompt::{build_user_prompt, PROMPT_VERSION, SYSTEM_PROMPT};
