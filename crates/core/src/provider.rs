use std::fmt;

use serde::Serialize;

use crate::types::AudioFormat;

pub const DEFAULT_GRADIO_SPACE: &str = "mrfakename/MeloTTS";
pub const DEFAULT_ELEVENLABS_VOICE: &str = "Sarah";

/// Text models offered by the front end, in display order.
pub const TEXT_MODELS: &[&str] = &[
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemma2-9b-it",
    "gemma2-2b-it",
    "llama3-8b-8192",
    "llama-3.1-8b-instant",
    "llama-3.1-70b-versatile",
    "gemma-7b-it",
];

/// Premade ElevenLabs voices that can be selected by name.
pub const ELEVENLABS_VOICES: &[&str] = &[
    "Sarah", "Laura", "Charlie", "George", "Callum", "Liam", "Charlotte", "Alice", "Matilda",
    "Will", "Jessica", "Eric", "Chris", "Brian", "Daniel", "Lily", "Bill",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProviderFamily {
    Gemini,
    Groq,
    ElevenLabs,
    Gradio,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub env_var: &'static str,
    pub credential_required: bool,
}

impl ProviderFamily {
    pub fn config(&self) -> ProviderConfig {
        match self {
            ProviderFamily::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai",
                env_var: "GEMINI_API_KEY",
                credential_required: true,
            },
            ProviderFamily::Groq => ProviderConfig {
                api_url: "https://api.groq.com/openai/v1",
                env_var: "GROQ_API_KEY",
                credential_required: true,
            },
            ProviderFamily::ElevenLabs => ProviderConfig {
                api_url: "https://api.elevenlabs.io/v1",
                env_var: "ELEVENLABS_API_KEY",
                credential_required: true,
            },
            // Public spaces accept anonymous calls; a token only raises quota.
            ProviderFamily::Gradio => ProviderConfig {
                api_url: "https://mrfakename-melotts.hf.space",
                env_var: "HF_TOKEN",
                credential_required: false,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderFamily::Gemini => "Gemini",
            ProviderFamily::Groq => "Groq",
            ProviderFamily::ElevenLabs => "ElevenLabs",
            ProviderFamily::Gradio => "Gradio",
        }
    }
}

/// An API key or token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input so that empty env vars count as unset.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TextProviderRef {
    Gemini { model: String },
    Groq { model: String },
}

impl TextProviderRef {
    /// Picks the hosting family from the model name. Gemini models are
    /// served by Google, everything else in [`TEXT_MODELS`] by Groq.
    pub fn from_model(model: &str) -> Self {
        let model = model.trim().to_string();
        if model.starts_with("gemini") {
            TextProviderRef::Gemini { model }
        } else {
            TextProviderRef::Groq { model }
        }
    }

    pub fn family(&self) -> ProviderFamily {
        match self {
            TextProviderRef::Gemini { .. } => ProviderFamily::Gemini,
            TextProviderRef::Groq { .. } => ProviderFamily::Groq,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            TextProviderRef::Gemini { model } | TextProviderRef::Groq { model } => model,
        }
    }
}

impl Default for TextProviderRef {
    fn default() -> Self {
        TextProviderRef::from_model(TEXT_MODELS[0])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SpeechProviderRef {
    ElevenLabs { voice: String },
    Gradio { endpoint: String },
}

impl SpeechProviderRef {
    pub fn family(&self) -> ProviderFamily {
        match self {
            SpeechProviderRef::ElevenLabs { .. } => ProviderFamily::ElevenLabs,
            SpeechProviderRef::Gradio { .. } => ProviderFamily::Gradio,
        }
    }

    /// The container every artifact from this provider is stored in.
    pub fn output_format(&self) -> AudioFormat {
        match self {
            SpeechProviderRef::ElevenLabs { .. } => AudioFormat::Mp3,
            SpeechProviderRef::Gradio { .. } => AudioFormat::Wav,
        }
    }
}

impl Default for SpeechProviderRef {
    fn default() -> Self {
        SpeechProviderRef::Gradio {
            endpoint: DEFAULT_GRADIO_SPACE.to_string(),
        }
    }
}
