use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::{Result, ScriptcastError},
    provider::{Credential, ProviderFamily},
};

pub const SUMMARIZE_PREFIX: &str = "Summarize the following text: ";

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable provider name used in errors and logs.
    fn provider_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;

    async fn summarize(&self, text: &str) -> Result<String> {
        self.generate(&format!("{SUMMARIZE_PREFIX}{text}")).await
    }
}

/// Client for OpenAI-compatible `/chat/completions` endpoints. Groq serves
/// this protocol natively, Gemini through its compatibility layer.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    family: ProviderFamily,
    base_url: String,
    model: String,
    api_key: Credential,
}

impl ChatCompletionsClient {
    pub fn new(
        family: ProviderFamily,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Credential,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            family,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn upstream(&self, reason: impl Into<String>) -> ScriptcastError {
        ScriptcastError::UpstreamGeneration {
            provider_name: self.family.name().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    fn provider_name(&self) -> &str {
        self.family.name()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(provider = self.family.name(), model = %self.model, prompt_len = prompt.len(), "chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
            }))
            .send()
            .await
            .map_err(|e| self.upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.upstream(format!("HTTP {status}: {body}")));
        }

        let response = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| self.upstream(format!("unreadable response: {e}")))?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| self.upstream(format!("Invalid API response: {response}")))?;

        Ok(content.to_string())
    }
}
