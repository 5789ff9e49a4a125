use std::path::PathBuf;

use serde::Serialize;

use crate::{
    error::{Result, ScriptcastError},
    provider::{SpeechProviderRef, TextProviderRef},
};

pub const MIN_TARGET_MINUTES: u32 = 1;
pub const MAX_TARGET_MINUTES: u32 = 120;

/// What the user asked for. Fields are read-only once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    title: String,
    target_minutes: u32,
    text_provider: TextProviderRef,
    speech_provider: SpeechProviderRef,
}

impl GenerationRequest {
    pub fn new(
        title: impl Into<String>,
        target_minutes: u32,
        text_provider: TextProviderRef,
        speech_provider: SpeechProviderRef,
    ) -> Self {
        Self {
            title: title.into(),
            target_minutes,
            text_provider,
            speech_provider,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn target_minutes(&self) -> u32 {
        self.target_minutes
    }

    pub fn text_provider(&self) -> &TextProviderRef {
        &self.text_provider
    }

    pub fn speech_provider(&self) -> &SpeechProviderRef {
        &self.speech_provider
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ScriptcastError::InvalidRequest {
                reason: "title must not be empty".to_string(),
            });
        }
        if !(MIN_TARGET_MINUTES..=MAX_TARGET_MINUTES).contains(&self.target_minutes) {
            return Err(ScriptcastError::InvalidRequest {
                reason: format!(
                    "target length must be between {} and {} minutes, got {}",
                    MIN_TARGET_MINUTES, MAX_TARGET_MINUTES, self.target_minutes
                ),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    text: String,
    query: String,
    source_count: usize,
}

impl Summary {
    pub fn new(text: impl Into<String>, query: impl Into<String>, source_count: usize) -> Self {
        Self {
            text: text.into(),
            query: query.into(),
            source_count,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn source_count(&self) -> usize {
        self.source_count
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScriptOrigin {
    New,
    Regenerated,
    Edited,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Script {
    pub content: String,
    pub origin: ScriptOrigin,
    pub source_summary: Summary,
}

impl Script {
    /// A hand-edited copy. The source summary is carried over.
    pub fn edited(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            origin: ScriptOrigin::Edited,
            source_summary: self.source_summary.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AudioFormat {
    /// Lossless PCM in a RIFF/WAVE container.
    Wav,
    /// Provider-encoded MPEG audio, stored untouched.
    Mp3,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    pub fn suggested_filename(&self) -> String {
        format!("tts_output.{}", self.extension())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AudioArtifact {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    pub mime_type: String,
    pub suggested_filename: String,
    pub backing_path: PathBuf,
}
