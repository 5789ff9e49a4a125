use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;

use super::{SpeechSynthesizer, SynthesizedAudio};
use crate::{
    error::{Result, ScriptcastError},
    provider::{Credential, ProviderFamily},
    types::AudioFormat,
};

pub const ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";
pub const ELEVENLABS_OUTPUT_FORMAT: &str = "mp3_44100_128";

#[derive(Deserialize)]
struct VoiceList {
    voices: Vec<Voice>,
}

#[derive(Deserialize)]
struct Voice {
    voice_id: String,
    name: String,
}

/// ElevenLabs REST text-to-speech. Returns MP3 bytes as produced by the API.
pub struct ElevenLabsTts {
    client: reqwest::Client,
    base_url: String,
    api_key: Credential,
    voice: String,
    voice_id: OnceCell<String>,
}

impl ElevenLabsTts {
    pub fn new(
        base_url: impl Into<String>,
        voice: impl Into<String>,
        api_key: Credential,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            voice: voice.into(),
            voice_id: OnceCell::new(),
        })
    }

    fn failed(&self, reason: impl Into<String>) -> ScriptcastError {
        ScriptcastError::Synthesis {
            provider_name: ProviderFamily::ElevenLabs.name().to_string(),
            reason: reason.into(),
        }
    }

    /// Maps a display name like "Sarah" to its voice id. Values that match
    /// no listed voice are assumed to already be ids.
    async fn resolve_voice_id(&self) -> Result<&str> {
        let id = self
            .voice_id
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .get(format!("{}/voices", self.base_url))
                    .header("xi-api-key", self.api_key.expose())
                    .send()
                    .await
                    .map_err(|e| self.failed(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(self.failed(format!("voice lookup HTTP {status}: {body}")));
                }

                let list = response
                    .json::<VoiceList>()
                    .await
                    .map_err(|e| self.failed(format!("unreadable voice list: {e}")))?;

                let id = list
                    .voices
                    .into_iter()
                    .find(|v| v.name.eq_ignore_ascii_case(&self.voice))
                    .map(|v| v.voice_id)
                    .unwrap_or_else(|| self.voice.clone());
                tracing::debug!(voice = %self.voice, voice_id = %id, "resolved ElevenLabs voice");
                Ok::<_, ScriptcastError>(id)
            })
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTts {
    fn provider_name(&self) -> &str {
        ProviderFamily::ElevenLabs.name()
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let voice_id = self.resolve_voice_id().await?;
        let url = format!("{}/text-to-speech/{voice_id}", self.base_url);

        let response = self
            .client
            .post(url)
            .query(&[("output_format", ELEVENLABS_OUTPUT_FORMAT)])
            .header("xi-api-key", self.api_key.expose())
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": ELEVENLABS_MODEL,
            }))
            .send()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.failed(format!("HTTP {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        Ok(SynthesizedAudio::Encoded {
            bytes: bytes.to_vec(),
            format: AudioFormat::Mp3,
        })
    }
}
