//! The classifier contract and its LLM-backed implementation.

use async_trait::async_trait;
use hnscout_core::{Item, LlmSettings, Verdict};

use crate::chat::ChatClient;
use crate::error::ClassifyError;
use crate::parse::parse_verdict;
use crate::prompt::{build_user_prompt, PROMPT_VERSION, SYSTEM_PROMPT};

/// Turns one item into a [`Verdict`] or a failure.
///
/// Implementations must not retry internally; a failed item is simply
/// reconsidered on a later run.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, item: &Item) -> Result<Verdict, ClassifyError>;
}

/// Classifier backed by a chat-completions model.
pub struct LlmClassifier {
    chat: ChatClient,
}

impl LlmClassifier {
    #[must_use]
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    /// # Errors
    ///
    /// Propagates [`ChatClient::from_settings`] errors.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, ClassifyError> {
        Ok(Self::new(ChatClient::from_settings(settings)?))
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, item: &Item) -> Result<Verdict, ClassifyError> {
        let prompt = build_user_prompt(item);
        tracing::debug!(
            item_id = item.id,
            model = self.chat.model(),
            prompt_version = PROMPT_VERSION,
            "classifying item"
        );

        let text = self.chat.complete(SYSTEM_PROMPT, &prompt).await?;
        let verdict = parse_verdict(&text)?;

        tracing::debug!(
            item_id = item.id,
            kind = %verdict.kind,
            innovation_score = verdict.innovation_score,
            "classification complete"
        );
        Ok(verdict)
    }
}
