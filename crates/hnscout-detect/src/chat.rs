//! Minimal chat-completions client (OpenAI and Azure OpenAI dialects).

use std::time::Duration;

use hnscout_core::{LlmProvider, LlmSettings};
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for a single-turn chat completion.
///
/// The configured timeout bounds the whole call; expiry surfaces as
/// [`ClassifyError::Timeout`].
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    provider: LlmProvider,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    json_mode: bool,
    timeout_secs: u64,
}

impl ChatClient {
    /// Build a client from LLM settings.
    ///
    /// # Errors
    ///
    /// - [`ClassifyError::MissingApiKey`] when no key is configured.
    /// - [`ClassifyError::InvalidBaseUrl`] when the base URL is not http(s).
    /// - [`ClassifyError::Transport`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, ClassifyError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClassifyError::MissingApiKey)?;

        let base = settings.base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClassifyError::InvalidBaseUrl(settings.base_url.clone()));
        }

        let endpoint = match settings.provider {
            LlmProvider::OpenAi => format!("{base}/chat/completions"),
            LlmProvider::Azure => format!(
                "{base}/openai/deployments/{}/chat/completions?api-version={}",
                settings.model, settings.api_version
            ),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ClassifyError::Transport)?;

        Ok(Self {
            client,
            endpoint,
            provider: settings.provider,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            json_mode: settings.json_mode,
            timeout_secs: settings.timeout_secs,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the assistant's text.
    ///
    /// # Errors
    ///
    /// - [`ClassifyError::Timeout`] if the call exceeds the configured timeout.
    /// - [`ClassifyError::Transport`] on any other network failure.
    /// - [`ClassifyError::Api`] on a non-2xx status.
    /// - [`ClassifyError::MalformedResponse`] if the envelope cannot be decoded
    ///   or carries no message content.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, ClassifyError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let builder = self.client.post(&self.endpoint).json(&request);
        let builder = match self.provider {
            LlmProvider::OpenAi => builder.bearer_auth(&self.api_key),
            LlmProvider::Azure => builder.header("api-key", &self.api_key),
        };

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "chat completion request rejected");
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClassifyError::MalformedResponse(format!("chat envelope: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ClassifyError::MalformedResponse("empty completion".to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ClassifyError {
        if e.is_timeout() {
            ClassifyError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ClassifyError::Transport(e)
        }
    }
}
