//! Shared test utilities: scripted stand-ins for the external services
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use baatgpt::{
    Assistant, AudioUpload, ChatCompleter, ChatReply, Error, Result, SynthesizedAudio,
    Synthesizer, Transcriber, Turn,
};

pub const SYSTEM_PROMPT: &str = "You are BaatGPT, a friendly AI assistant for Pakistan.";

/// Transcriber that returns queued transcripts, or fails when the queue is empty
#[derive(Default)]
pub struct ScriptedTranscriber {
    transcripts: Mutex<VecDeque<String>>,
    pub calls: AtomicUsize,
    pub last_mime: Mutex<Option<String>>,
    watch_dir: Option<PathBuf>,
    /// Files present in the watched directory during each call
    pub staged_during_call: Mutex<Vec<usize>>,
}

impl ScriptedTranscriber {
    pub fn new(transcripts: &[&str]) -> Self {
        Self {
            transcripts: Mutex::new(transcripts.iter().map(|t| (*t).to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Count the files in `dir` whenever a transcription is requested
    pub fn watching(mut self, dir: &Path) -> Self {
        self.watch_dir = Some(dir.to_path_buf());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, audio: &[u8], _file_name: &str, mime: &str) -> Result<String> {
        assert!(!audio.is_empty(), "transcriber received empty audio");
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_mime.lock().unwrap() = Some(mime.to_string());
        if let Some(dir) = &self.watch_dir {
            let count = std::fs::read_dir(dir).unwrap().count();
            self.staged_during_call.lock().unwrap().push(count);
        }

        self.transcripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Transcription("API error 500: boom".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// How the scripted chat service answers
#[derive(Clone, Copy)]
pub enum ChatBehavior {
    /// Reply "reply N" for the Nth call (1-based)
    Numbered,
    /// Reply with a fixed text
    Fixed(&'static str),
    /// Response without a reply field
    Placeholder,
    /// Transport/status failure
    Fail,
}

/// Chat service that records every request it receives
pub struct ScriptedChat {
    behavior: ChatBehavior,
    pub requests: Mutex<Vec<(String, Vec<Turn>)>>,
}

impl ScriptedChat {
    pub fn new(behavior: ChatBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatCompleter for ScriptedChat {
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<ChatReply> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((system_prompt.to_string(), history.to_vec()));
            requests.len()
        };

        match self.behavior {
            ChatBehavior::Numbered => Ok(ChatReply::new(format!("reply {n}"))),
            ChatBehavior::Fixed(text) => Ok(ChatReply::new(text)),
            ChatBehavior::Placeholder => Ok(ChatReply::placeholder()),
            ChatBehavior::Fail => Err(Error::Chat("API error 503: unavailable".to_string())),
        }
    }
}

/// Synthesizer producing a tiny WAV, or failing
pub struct ScriptedSynth {
    fail: bool,
    pub calls: AtomicUsize,
}

impl ScriptedSynth {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynth {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        assert!(!text.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Synthesis("engine 'espeak-ng' not found".to_string()));
        }
        Ok(SynthesizedAudio {
            data: wav_bytes(800),
            mime: "audio/wav",
        })
    }
}

/// Build an assistant from the given stand-ins
pub fn assistant(
    stt: &Arc<ScriptedTranscriber>,
    chat: &Arc<ScriptedChat>,
    tts: &Arc<ScriptedSynth>,
) -> Assistant {
    Assistant::new(
        stt.clone(),
        chat.clone(),
        tts.clone(),
        SYSTEM_PROMPT.to_string(),
    )
}

/// Silent 16 kHz mono WAV with the given number of samples
pub fn wav_bytes(samples: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for _ in 0..samples {
            writer.write_sample(0i16).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// A valid WAV upload
pub fn wav_upload() -> AudioUpload {
    AudioUpload::new("question.wav", Some("audio/wav"), wav_bytes(1600)).expect("valid upload")
}
