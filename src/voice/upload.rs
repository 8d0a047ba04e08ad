//! Uploaded audio validation and scoped temporary staging

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    /// Detect format from a file name extension (case-insensitive)
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            _ => None,
        }
    }

    /// Detect format from a declared MIME type
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            _ => None,
        }
    }

    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

/// A validated audio upload
#[derive(Debug, Clone)]
pub struct AudioUpload {
    data: Vec<u8>,
    file_name: String,
    format: AudioFormat,
}

impl AudioUpload {
    /// Validate an uploaded payload
    ///
    /// The format comes from the file extension, falling back to the declared
    /// content type when the name has no recognizable extension.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is empty or not WAV/MP3
    pub fn new(file_name: &str, content_type: Option<&str>, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Upload("empty audio data".to_string()));
        }

        let format = AudioFormat::from_file_name(file_name)
            .or_else(|| content_type.and_then(AudioFormat::from_mime))
            .ok_or_else(|| {
                Error::Upload(format!(
                    "unsupported audio file '{file_name}', expected .wav or .mp3"
                ))
            })?;

        let file_name = if AudioFormat::from_file_name(file_name).is_some() {
            file_name.to_string()
        } else {
            format!("audio.{}", format.extension())
        };

        Ok(Self {
            data,
            file_name,
            format,
        })
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Write the payload to a temporary file removed when the guard drops
    ///
    /// # Errors
    ///
    /// Returns error if the temporary file cannot be created or written
    pub fn stage(&self) -> Result<StagedAudio> {
        self.stage_in(&std::env::temp_dir())
    }

    /// Like [`stage`](Self::stage), inside `dir`
    ///
    /// # Errors
    ///
    /// Returns error if the temporary file cannot be created or written
    pub fn stage_in(&self, dir: &Path) -> Result<StagedAudio> {
        let mut file = tempfile::Builder::new()
            .prefix("baatgpt-upload-")
            .suffix(&format!(".{}", self.format.extension()))
            .tempfile_in(dir)?;
        file.write_all(&self.data)?;
        file.flush()?;

        tracing::debug!(
            path = %file.path().display(),
            bytes = self.data.len(),
            "staged uploaded audio"
        );

        Ok(StagedAudio {
            file,
            format: self.format,
        })
    }
}

/// Uploaded audio held on disk for the duration of one request
#[derive(Debug)]
pub struct StagedAudio {
    file: NamedTempFile,
    format: AudioFormat,
}

impl StagedAudio {
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Read the staged bytes back from disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }
}
