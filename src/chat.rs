//! Chat-completion client

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::ChatConfig;
use crate::session::Turn;
use crate::{Error, Result};

/// Reply text used when the completion carries no message content
pub const PLACEHOLDER_REPLY: &str = "❌ AI did not return a valid reply";

/// Assistant reply from a chat completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    /// Set when the response lacked a reply and the placeholder was substituted
    pub placeholder: bool,
}

impl ChatReply {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            placeholder: false,
        }
    }

    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            content: PLACEHOLDER_REPLY.to_string(),
            placeholder: true,
        }
    }
}

/// Generates assistant replies from a conversation
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Complete a conversation; `system_prompt` is prepended to `history` for this call only
    ///
    /// # Errors
    ///
    /// Returns `Error::Chat` on transport, status or malformed-body failures
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<ChatReply>;
}

/// Build the outbound message list: system turn first, then history in order
#[must_use]
pub fn build_messages(system_prompt: &str, history: &[Turn]) -> Vec<Turn> {
    std::iter::once(Turn::system(system_prompt))
        .chain(history.iter().cloned())
        .collect()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Turn>,
    temperature: f32,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`)
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[allow(clippy::option_option)]
struct ChatResponse {
    #[serde(default, deserialize_with = "present")]
    choices: Option<Option<Vec<Choice>>>,
}

#[derive(Deserialize)]
#[allow(clippy::option_option)]
struct Choice {
    #[serde(default, deserialize_with = "present")]
    message: Option<Option<ChoiceMessage>>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// Reply from the first choice
    ///
    /// Absent `choices`, `message` or `content` keys yield the placeholder.
    /// An empty `choices` list or a `null` in place of a list or message is malformed.
    fn into_reply(self) -> Result<ChatReply> {
        let Some(choices) = self.choices else {
            return Ok(ChatReply::placeholder());
        };
        let first = choices
            .ok_or_else(|| Error::Chat("response has null choices".to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Chat("response has no choices".to_string()))?;

        match first.message {
            None => Ok(ChatReply::placeholder()),
            Some(None) => Err(Error::Chat("first choice has a null message".to_string())),
            Some(Some(message)) => Ok(message
                .content
                .map_or_else(ChatReply::placeholder, ChatReply::new)),
        }
    }
}

/// OpenAI-compatible chat-completion client
pub struct ChatClient {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        config: &ChatConfig,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("API key required for chat".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatCompleter for ChatClient {
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<ChatReply> {
        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(system_prompt, history),
            temperature: self.temperature,
        };

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat request failed");
                Error::Chat(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Chat(format!("API error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat response");
            Error::Chat(e.to_string())
        })?;

        let reply = result.into_reply().inspect_err(|e| {
            tracing::error!(error = %e, "malformed chat response");
        })?;
        if reply.placeholder {
            tracing::warn!("chat response had no reply content, using placeholder");
        }
        Ok(reply)
    }
}
