//! Text-to-speech (TTS) via a local offline engine
//!
//! Runs an eSpeak-compatible program (`espeak-ng` by default), feeding the
//! text on stdin and letting it write the audio file at a fixed path, which
//! is then read back for playback.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::{SynthesizedAudio, Synthesizer};
use crate::config::TtsConfig;
use crate::{Error, Result};

/// Synthesizes speech with a local engine process
pub struct TextToSpeech {
    engine: String,
    voice: Option<String>,
    rate: u32,
    output_path: PathBuf,
    timeout: Duration,
    /// Guards the fixed output path, shared by every session
    output_lock: Mutex<()>,
}

impl TextToSpeech {
    /// Create a TTS instance from configuration
    #[must_use]
    pub fn new(config: &TtsConfig) -> Self {
        Self {
            engine: config.engine.clone(),
            voice: config.voice.clone(),
            rate: config.rate,
            output_path: config.output_path.clone(),
            timeout: config.timeout,
            output_lock: Mutex::new(()),
        }
    }

    /// Path the synthesized reply is written to
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Whether the engine program can be found
    #[must_use]
    pub fn engine_available(&self) -> bool {
        which::which(&self.engine).is_ok()
    }

    fn engine_args(&self) -> Vec<String> {
        let mut args = vec![
            "--stdin".to_string(),
            "-w".to_string(),
            self.output_path.display().to_string(),
            "-s".to_string(),
            self.rate.to_string(),
        ];
        if let Some(voice) = &self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        args
    }

    async fn run_engine(&self, text: &str) -> Result<()> {
        let program = which::which(&self.engine)
            .map_err(|e| Error::Synthesis(format!("engine '{}' not found: {e}", self.engine)))?;

        let mut child = Command::new(&program)
            .args(self.engine_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Synthesis(format!("failed to start engine: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| Error::Synthesis(format!("failed to write to engine stdin: {e}")))?;
        }

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Synthesis(format!("engine timed out after {:?}", self.timeout)))?
            .map_err(|e| Error::Synthesis(format!("engine execution failed: {e}")))?;

        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(engine = %self.engine, stderr = %stderr, "engine stderr");
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            return Err(Error::Synthesis(format!("engine exited with code {code}")));
        }

        Ok(())
    }
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        if text.trim().is_empty() {
            return Err(Error::Synthesis("nothing to synthesize".to_string()));
        }

        let _guard = self.output_lock.lock().await;

        // The previous turn's file must not stand in for this reply
        match tokio::fs::remove_file(&self.output_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Synthesis(format!(
                    "failed to clear {}: {e}",
                    self.output_path.display()
                )));
            }
        }

        self.run_engine(text).await?;

        let data = tokio::fs::read(&self.output_path).await.map_err(|e| {
            Error::Synthesis(format!(
                "failed to read {}: {e}",
                self.output_path.display()
            ))
        })?;

        if data.is_empty() {
            return Err(Error::Synthesis("engine produced no audio".to_string()));
        }

        let mime = mime_for_path(&self.output_path);
        if let Some(secs) = wav_duration_secs(&data) {
            tracing::info!(bytes = data.len(), duration_secs = secs, "synthesized reply");
        } else {
            tracing::info!(bytes = data.len(), "synthesized reply");
        }

        Ok(SynthesizedAudio { data, mime })
    }
}

/// MIME type for the synthesized file, from its extension
fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Duration of WAV data, if it parses as WAV
#[allow(clippy::cast_precision_loss)]
fn wav_duration_secs(data: &[u8]) -> Option<f32> {
    let reader = hound::WavReader::new(Cursor::new(data)).ok()?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return None;
    }
    Some(reader.duration() as f32 / sample_rate as f32)
}
