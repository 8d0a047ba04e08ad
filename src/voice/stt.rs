//! Speech-to-text (STT) processing

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::Transcriber;
use crate::{Error, Result};

/// Response from the Whisper-compatible transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Transcribes speech to text through an OpenAI-compatible Whisper endpoint
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            endpoint: format!("{}/audio/transcriptions", base_url.trim_end_matches('/')),
            model,
        })
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio: &[u8], file_name: &str, mime: &str) -> Result<String> {
        tracing::debug!(
            audio_bytes = audio.len(),
            model = %self.model,
            "starting transcription"
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name(file_name.to_string())
                    .mime_str(mime)
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                Error::Transcription(e.to_string())
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Transcription(format!("API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            Error::Transcription(e.to_string())
        })?;

        let text = result
            .text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Transcription("could not transcribe audio".to_string()))?;

        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}
