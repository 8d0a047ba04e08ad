//! TOML configuration file loading
//!
//! Supports `~/.config/baatgpt/config.toml` as a persistent config source and
//! `~/.config/baatgpt/secrets.toml` for the API key.
//! All fields are optional: the files are partial overlays on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct BaatConfigFile {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiFileConfig,

    /// Chat-completion configuration
    #[serde(default)]
    pub chat: ChatFileConfig,

    /// Local speech synthesis configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Remote speech/chat API configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    /// OpenAI-compatible base URL (e.g. `https://api.groq.com/openai/v1`)
    pub base_url: Option<String>,

    /// Transcription model (e.g. "whisper-large-v3-turbo")
    pub stt_model: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Chat-completion configuration
#[derive(Debug, Default, Deserialize)]
pub struct ChatFileConfig {
    /// Model identifier (e.g. "llama-3.1-8b-instant")
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// System prompt prepended to every request
    pub system_prompt: Option<String>,
}

/// Local text-to-speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Engine program (e.g. "espeak-ng")
    pub engine: Option<String>,

    /// Engine voice name
    pub voice: Option<String>,

    /// Speaking rate in words per minute
    pub rate: Option<u32>,

    /// Fixed path the synthesized reply is written to
    pub output_path: Option<String>,

    /// Engine timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP server port
    pub port: Option<u16>,

    /// Directory whose `index.html` replaces the embedded page
    pub static_dir: Option<String>,
}

/// Secrets file schema
#[derive(Debug, Default, Deserialize)]
pub struct SecretsFile {
    #[serde(rename = "GROQ_API_KEY")]
    pub groq_api_key: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `BaatConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> BaatConfigFile {
    config_file_path().map_or_else(BaatConfigFile::default, |path| load_toml(&path))
}

/// Load the secrets file
///
/// `BAATGPT_SECRETS_FILE` overrides the standard location.
#[must_use]
pub fn load_secrets_file() -> SecretsFile {
    std::env::var("BAATGPT_SECRETS_FILE")
        .ok()
        .map(PathBuf::from)
        .or_else(|| config_dir().map(|d| d.join("secrets.toml")))
        .map_or_else(SecretsFile::default, |path| load_toml(&path))
}

/// Read and parse a TOML file, falling back to defaults on any failure
pub fn load_toml<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(parsed) => {
                tracing::info!(path = %path.display(), "loaded config file");
                parsed
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                T::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            T::default()
        }
    }
}

/// Return the config file path: `~/.config/baatgpt/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

fn config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("baatgpt"))
}
