use std::{io::Cursor, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{SpeechSynthesizer, SynthesizedAudio};
use crate::{
    error::{Result, ScriptcastError},
    provider::{Credential, ProviderFamily},
};

/// Route prefixes tried in order: Gradio 5 mounts the API under
/// `/gradio_api`, Gradio 4 at the root.
const API_PREFIXES: [&str; 2] = ["/gradio_api", ""];

#[derive(Clone, Debug)]
pub struct MeloVoice {
    pub api_name: String,
    pub speaker: String,
    pub speed: f32,
    pub language: String,
}

impl Default for MeloVoice {
    fn default() -> Self {
        Self {
            api_name: "synthesize".to_string(),
            speaker: "EN-US".to_string(),
            speed: 1.0,
            language: "EN".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct EventId {
    event_id: String,
}

#[derive(Deserialize)]
struct FileData {
    path: Option<String>,
    url: Option<String>,
}

/// Speech through a hosted Gradio app (a MeloTTS space by default). The app
/// returns a WAV file which is decoded back into samples.
pub struct GradioTts {
    client: reqwest::Client,
    base_url: String,
    token: Option<Credential>,
    voice: MeloVoice,
}

/// Turns `owner/space` into its `hf.space` host; full URLs pass through.
pub fn space_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    let host = endpoint.to_lowercase().replace(['/', '.', '_'], "-");
    format!("https://{host}.hf.space")
}

impl GradioTts {
    pub fn new(
        endpoint: &str,
        voice: MeloVoice,
        token: Option<Credential>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: space_url(endpoint),
            token,
            voice,
        })
    }

    fn failed(&self, reason: impl Into<String>) -> ScriptcastError {
        ScriptcastError::Synthesis {
            provider_name: ProviderFamily::Gradio.name().to_string(),
            reason: reason.into(),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    /// Queues the prediction, returning the route prefix that accepted it.
    async fn submit(&self, text: &str) -> Result<(&'static str, String)> {
        let payload = json!({
            "data": [self.voice.speaker, text, self.voice.speed, self.voice.language],
        });

        for prefix in API_PREFIXES {
            let url = format!("{}{prefix}/call/{}", self.base_url, self.voice.api_name);
            let response = self
                .authorized(self.client.post(&url))
                .json(&payload)
                .send()
                .await
                .map_err(|e| self.failed(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(self.failed(format!("HTTP {status}: {body}")));
            }

            let event = response
                .json::<EventId>()
                .await
                .map_err(|e| self.failed(format!("missing event id: {e}")))?;
            return Ok((prefix, event.event_id));
        }

        Err(self.failed(format!(
            "no /call/{} route on {}",
            self.voice.api_name, self.base_url
        )))
    }

    async fn fetch_result(&self, prefix: &str, event_id: &str) -> Result<FileData> {
        let url = format!(
            "{}{prefix}/call/{}/{event_id}",
            self.base_url, self.voice.api_name
        );
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failed(format!("result stream HTTP {status}")));
        }

        let stream = response
            .text()
            .await
            .map_err(|e| self.failed(e.to_string()))?;
        let data = parse_completion(&stream).map_err(|reason| self.failed(reason))?;

        let file = match data {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        serde_json::from_value::<FileData>(file)
            .map_err(|e| self.failed(format!("unexpected result payload: {e}")))
    }

    async fn download(&self, prefix: &str, file: &FileData) -> Result<Vec<u8>> {
        let url = match (&file.url, &file.path) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => format!("{}{prefix}/file={path}", self.base_url),
            (None, None) => return Err(self.failed("result carries no file")),
        };

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failed(format!("file download HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.failed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GradioTts {
    fn provider_name(&self) -> &str {
        ProviderFamily::Gradio.name()
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let (prefix, event_id) = self.submit(text).await?;
        tracing::debug!(base_url = %self.base_url, %event_id, "gradio prediction queued");

        let file = self.fetch_result(prefix, &event_id).await?;
        let wav = self.download(prefix, &file).await?;
        decode_wav(&wav).map_err(|e| self.failed(format!("result is not a WAV file: {e}")))
    }
}

/// Reads the server-sent event stream of a Gradio call and returns the
/// `data` payload of its `complete` event.
pub fn parse_completion(stream: &str) -> std::result::Result<Value, String> {
    let mut event = "";
    for line in stream.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            match event {
                "complete" => {
                    return serde_json::from_str(data.trim())
                        .map_err(|e| format!("malformed completion data: {e}"));
                }
                "error" => return Err(format!("app reported an error: {}", data.trim())),
                _ => {}
            }
        }
    }
    Err("stream ended without a result".to_string())
}

/// Decodes a WAV file into normalized float samples.
pub fn decode_wav(bytes: &[u8]) -> std::result::Result<SynthesizedAudio, hound::Error> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(SynthesizedAudio::Samples {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
