//! The voice interaction pipeline
//!
//! One linear pass per uploaded clip:
//!
//! ```text
//! ingest → transcribe → append(user) → chat → append(assistant) → synthesize
//! ```
//!
//! Transcription and chat failures halt the request. Synthesis failures are
//! reported as a warning alongside the text reply.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::chat::{ChatClient, ChatCompleter, ChatReply};
use crate::config::Config;
use crate::session::{Session, Turn};
use crate::voice::{
    AudioUpload, SpeechToText, SynthesizedAudio, Synthesizer, TextToSpeech, Transcriber,
};
use crate::Result;

/// Outcome of one successful voice interaction
#[derive(Debug, Clone)]
pub struct Interaction {
    /// What the user said
    pub transcript: String,
    /// What the assistant replied
    pub reply: ChatReply,
    /// Synthesized reply, absent when synthesis failed
    pub audio: Option<SynthesizedAudio>,
    /// User-visible synthesis warning
    pub warning: Option<String>,
}

/// Orchestrates transcription, chat, and synthesis for a session
pub struct Assistant {
    transcriber: Arc<dyn Transcriber>,
    chat: Arc<dyn ChatCompleter>,
    synthesizer: Arc<dyn Synthesizer>,
    system_prompt: String,
    /// Where uploads are staged for the duration of a request
    staging_dir: PathBuf,
}

impl Assistant {
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        chat: Arc<dyn ChatCompleter>,
        synthesizer: Arc<dyn Synthesizer>,
        system_prompt: String,
    ) -> Self {
        Self {
            transcriber,
            chat,
            synthesizer,
            system_prompt,
            staging_dir: std::env::temp_dir(),
        }
    }

    /// Stage uploads in `dir` instead of the system temp directory
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Build the production pipeline from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a remote client cannot be constructed
    pub fn from_config(config: &Config) -> Result<Self> {
        let key = || SecretString::from(config.api_key.expose_secret().to_owned());

        let stt = SpeechToText::new(
            key(),
            &config.api.base_url,
            config.api.stt_model.clone(),
            config.api.timeout,
        )?;
        let chat = ChatClient::new(key(), &config.api.base_url, &config.chat, config.api.timeout)?;
        let tts = TextToSpeech::new(&config.tts);

        if !tts.engine_available() {
            tracing::warn!(
                engine = %config.tts.engine,
                "TTS engine not found, replies will be text-only"
            );
        }

        Ok(Self::new(
            Arc::new(stt),
            Arc::new(chat),
            Arc::new(tts),
            config.chat.system_prompt.clone(),
        ))
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Transcribe an upload without touching any session
    ///
    /// # Errors
    ///
    /// Returns error if staging or transcription fails
    pub async fn transcribe(&self, upload: &AudioUpload) -> Result<String> {
        let staged = upload.stage_in(&self.staging_dir)?;
        let audio = staged.read().await?;
        self.transcriber
            .transcribe(&audio, upload.file_name(), upload.format().mime())
            .await
    }

    /// Run one full interaction against a session
    ///
    /// # Errors
    ///
    /// Returns `Error::Upload`/`Error::Io` if staging fails,
    /// `Error::Transcription` if nothing could be transcribed (history untouched),
    /// or `Error::Chat` if the completion call fails (the user turn stays in history).
    pub async fn interact(
        &self,
        session: &mut Session,
        upload: &AudioUpload,
    ) -> Result<Interaction> {
        tracing::info!(
            session_id = %session.id(),
            file = %upload.file_name(),
            bytes = upload.data().len(),
            stt = self.transcriber.name(),
            "processing audio"
        );

        let transcript = self.transcribe(upload).await.inspect_err(|e| {
            tracing::warn!(session_id = %session.id(), error = %e, "transcription failed");
        })?;

        session.history_mut().append(Turn::user(transcript.clone()));

        let reply = self
            .chat
            .complete(&self.system_prompt, session.history().snapshot())
            .await
            .inspect_err(|e| {
                tracing::warn!(session_id = %session.id(), error = %e, "chat failed");
            })?;

        session
            .history_mut()
            .append(Turn::assistant(reply.content.clone()));

        let (audio, warning) = match self.synthesizer.synthesize(&reply.content).await {
            Ok(audio) => (Some(audio), None),
            Err(e) => {
                tracing::warn!(session_id = %session.id(), error = %e, "synthesis failed");
                (None, Some(e.to_string()))
            }
        };

        tracing::info!(
            session_id = %session.id(),
            turns = session.history().len(),
            placeholder = reply.placeholder,
            audio = audio.is_some(),
            "interaction complete"
        );

        Ok(Interaction {
            transcript,
            reply,
            audio,
            warning,
        })
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("stt", &self.transcriber.name())
            .field("system_prompt", &self.system_prompt)
            .finish_non_exhaustive()
    }
}
