use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    config::{DEFAULT_SPEECH_TIMEOUT, DEFAULT_TEXT_TIMEOUT, Settings},
    error::{Result, ScriptcastError},
    llm::{ChatCompletionsClient, TextGenerator},
    provider::{Credential, ProviderFamily, SpeechProviderRef, TextProviderRef},
    tts::{ElevenLabsTts, GradioTts, SpeechSynthesizer, gradio::MeloVoice},
};

#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub credential: Option<Credential>,
    /// Replaces the family's public API root, e.g. to reach a mock server.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl ProviderSettings {
    fn defaults_for(family: ProviderFamily) -> Self {
        let timeout = match family {
            ProviderFamily::Gemini | ProviderFamily::Groq => DEFAULT_TEXT_TIMEOUT,
            ProviderFamily::ElevenLabs | ProviderFamily::Gradio => DEFAULT_SPEECH_TIMEOUT,
        };
        Self {
            credential: None,
            base_url: None,
            timeout,
        }
    }
}

/// Turns provider refs into ready adapters.
pub trait ProviderResolver: Send + Sync {
    fn resolve_text_provider(&self, provider: &TextProviderRef) -> Result<Arc<dyn TextGenerator>>;

    fn resolve_speech_provider(
        &self,
        provider: &SpeechProviderRef,
    ) -> Result<Arc<dyn SpeechSynthesizer>>;
}

/// Configured providers and their credentials. Building adapters here
/// never touches the network.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderFamily, ProviderSettings>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut registry = Self::new();
        for family in [
            ProviderFamily::Gemini,
            ProviderFamily::Groq,
            ProviderFamily::ElevenLabs,
            ProviderFamily::Gradio,
        ] {
            let timeout = match family {
                ProviderFamily::Gemini | ProviderFamily::Groq => settings.text_timeout,
                ProviderFamily::ElevenLabs | ProviderFamily::Gradio => settings.speech_timeout,
            };
            let base_url = match family {
                ProviderFamily::Gradio => settings.gradio_endpoint.clone(),
                _ => None,
            };
            registry.providers.insert(
                family,
                ProviderSettings {
                    credential: settings.credentials.get(&family).cloned(),
                    base_url,
                    timeout,
                },
            );
        }
        registry
    }

    pub fn configure(mut self, family: ProviderFamily, settings: ProviderSettings) -> Self {
        self.providers.insert(family, settings);
        self
    }

    pub fn with_credential(mut self, family: ProviderFamily, credential: Credential) -> Self {
        self.entry(family).credential = Some(credential);
        self
    }

    pub fn with_base_url(mut self, family: ProviderFamily, base_url: impl Into<String>) -> Self {
        self.entry(family).base_url = Some(base_url.into());
        self
    }

    pub fn is_configured(&self, family: ProviderFamily) -> bool {
        self.credential(family).is_ok()
    }

    fn entry(&mut self, family: ProviderFamily) -> &mut ProviderSettings {
        self.providers
            .entry(family)
            .or_insert_with(|| ProviderSettings::defaults_for(family))
    }

    fn settings(&self, family: ProviderFamily) -> ProviderSettings {
        self.providers
            .get(&family)
            .cloned()
            .unwrap_or_else(|| ProviderSettings::defaults_for(family))
    }

    fn credential(&self, family: ProviderFamily) -> Result<Option<Credential>> {
        let credential = self.providers.get(&family).and_then(|s| s.credential.clone());
        let config = family.config();
        if credential.is_none() && config.credential_required {
            return Err(ScriptcastError::UnconfiguredProvider {
                provider_name: family.name().to_string(),
                env_var: config.env_var.to_string(),
            });
        }
        Ok(credential)
    }

    pub fn resolve_text_provider(
        &self,
        provider: &TextProviderRef,
    ) -> Result<Arc<dyn TextGenerator>> {
        let family = provider.family();
        let credential = self.credential(family)?.ok_or_else(|| {
            ScriptcastError::UnconfiguredProvider {
                provider_name: family.name().to_string(),
                env_var: family.config().env_var.to_string(),
            }
        })?;
        let settings = self.settings(family);
        let base_url = settings
            .base_url
            .unwrap_or_else(|| family.config().api_url.to_string());

        let client = ChatCompletionsClient::new(
            family,
            base_url,
            provider.model(),
            credential,
            settings.timeout,
        )?;
        Ok(Arc::new(client))
    }

    pub fn resolve_speech_provider(
        &self,
        provider: &SpeechProviderRef,
    ) -> Result<Arc<dyn SpeechSynthesizer>> {
        let family = provider.family();
        let credential = self.credential(family)?;
        let settings = self.settings(family);

        match provider {
            SpeechProviderRef::ElevenLabs { voice } => {
                let api_key = credential.ok_or_else(|| ScriptcastError::UnconfiguredProvider {
                    provider_name: family.name().to_string(),
                    env_var: family.config().env_var.to_string(),
                })?;
                let base_url = settings
                    .base_url
                    .unwrap_or_else(|| family.config().api_url.to_string());
                Ok(Arc::new(ElevenLabsTts::new(
                    base_url,
                    voice.clone(),
                    api_key,
                    settings.timeout,
                )?))
            }
            SpeechProviderRef::Gradio { endpoint } => {
                let endpoint = settings.base_url.as_deref().unwrap_or(endpoint);
                Ok(Arc::new(GradioTts::new(
                    endpoint,
                    MeloVoice::default(),
                    credential,
                    settings.timeout,
                )?))
            }
        }
    }
}

impl ProviderResolver for ProviderRegistry {
    fn resolve_text_provider(&self, provider: &TextProviderRef) -> Result<Arc<dyn TextGenerator>> {
        ProviderRegistry::resolve_text_provider(self, provider)
    }

    fn resolve_speech_provider(
        &self,
        provider: &SpeechProviderRef,
    ) -> Result<Arc<dyn SpeechSynthesizer>> {
        ProviderRegistry::resolve_speech_provider(self, provider)
    }
}
