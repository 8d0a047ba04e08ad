//! Configuration management for the BaatGPT assistant

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

/// Default OpenAI-compatible API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default transcription model
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3-turbo";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// Default system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are BaatGPT, a friendly AI assistant for Pakistan.";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default server port
pub const DEFAULT_PORT: u16 = 8501;

/// BaatGPT configuration
#[derive(Debug)]
pub struct Config {
    /// API key for the remote speech and chat services
    pub api_key: SecretString,

    /// Remote API configuration
    pub api: ApiConfig,

    /// Chat-completion configuration
    pub chat: ChatConfig,

    /// Local speech synthesis configuration
    pub tts: TtsConfig,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Remote API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,

    /// Transcription model identifier
    pub stt_model: String,

    /// Timeout applied to each outbound HTTP request
    pub timeout: Duration,
}

/// Chat-completion configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// System prompt prepended at call time, never stored in history
    pub system_prompt: String,
}

/// Local text-to-speech configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Engine program name or path
    pub engine: String,

    /// Engine voice name
    pub voice: Option<String>,

    /// Speaking rate in words per minute
    pub rate: u32,

    /// Fixed output path, overwritten every turn
    pub output_path: PathBuf,

    /// Engine timeout
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: "espeak-ng".to_string(),
            voice: None,
            rate: 175,
            output_path: PathBuf::from("baatgpt_reply.wav"),
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Directory whose `index.html` replaces the embedded page
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        let secrets = file::load_secrets_file();
        Self::from_sources(fc, secrets, |name| std::env::var(name).ok())
    }

    /// Build configuration from a parsed config file, secrets file, and env lookup
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured
    pub fn from_sources(
        fc: file::BaatConfigFile,
        secrets: file::SecretsFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = env("GROQ_API_KEY")
            .or(secrets.groq_api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "GROQ_API_KEY not found; set it in the environment or in secrets.toml"
                        .to_string(),
                )
            })?;

        let api = ApiConfig {
            base_url: env("BAATGPT_BASE_URL")
                .or(fc.api.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            stt_model: env("BAATGPT_STT_MODEL")
                .or(fc.api.stt_model)
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            timeout: Duration::from_secs(
                env("BAATGPT_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .or(fc.api.timeout_secs)
                    .unwrap_or(120),
            ),
        };

        let chat = ChatConfig {
            model: env("BAATGPT_CHAT_MODEL")
                .or(fc.chat.model)
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            temperature: env("BAATGPT_TEMPERATURE")
                .and_then(|s| s.parse().ok())
                .or(fc.chat.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            system_prompt: env("BAATGPT_SYSTEM_PROMPT")
                .or(fc.chat.system_prompt)
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        let default_tts = TtsConfig::default();
        let tts = TtsConfig {
            engine: env("BAATGPT_TTS_ENGINE")
                .or(fc.tts.engine)
                .unwrap_or(default_tts.engine),
            voice: env("BAATGPT_TTS_VOICE").or(fc.tts.voice),
            rate: fc.tts.rate.unwrap_or(default_tts.rate),
            output_path: env("BAATGPT_TTS_OUTPUT")
                .or(fc.tts.output_path)
                .map_or(default_tts.output_path, PathBuf::from),
            timeout: fc
                .tts
                .timeout_secs
                .map_or(default_tts.timeout, Duration::from_secs),
        };

        let server = ServerConfig {
            port: env("BAATGPT_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("BAATGPT_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            api,
            chat,
            tts,
            server,
        })
    }
}
