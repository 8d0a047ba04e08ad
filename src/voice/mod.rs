//! Voice processing module
//!
//! Handles uploaded audio, speech-to-text through the remote Whisper API,
//! and reply synthesis through a local text-to-speech engine.

mod stt;
mod tts;
mod upload;

use async_trait::async_trait;

pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use upload::{AudioFormat, AudioUpload, StagedAudio};

use crate::Result;

/// Converts recorded speech into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes, returning non-empty text
    ///
    /// # Errors
    ///
    /// Returns `Error::Transcription` on transport, status, or empty-result failures
    async fn transcribe(&self, audio: &[u8], file_name: &str, mime: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Synthesized reply audio
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    pub mime: &'static str,
}

/// Converts reply text into playable audio
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text to audio
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` if the engine or file I/O fails
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}
