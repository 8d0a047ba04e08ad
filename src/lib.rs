//! BaatGPT - voice-driven chat assistant
//!
//! A user uploads a short audio clip; the assistant transcribes it, sends the
//! transcript with the running conversation to a chat-completion service, and
//! speaks the reply back with a local text-to-speech engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Single page  /  HTTP API                │
//! └────────────────────┬────────────────────────────────┘
//!                      │ upload
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Assistant                          │
//! │   Session history  │  STT  │  Chat  │  Local TTS     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │     Whisper API   │   Chat API   │   espeak-ng       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod session;
pub mod voice;

pub use assistant::{Assistant, Interaction};
pub use chat::{ChatClient, ChatCompleter, ChatReply, PLACEHOLDER_REPLY};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{ConversationHistory, Role, Session, SessionStore, Turn};
pub use voice::{AudioUpload, SpeechToText, SynthesizedAudio, Synthesizer, TextToSpeech, Transcriber};
