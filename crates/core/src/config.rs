use std::{collections::HashMap, str::FromStr, time::Duration};

use crate::{
    pipeline::RetryPolicy,
    provider::{Credential, ProviderFamily},
};

pub const GRADIO_ENDPOINT_ENV: &str = "SCRIPTCAST_GRADIO_ENDPOINT";
pub const TEXT_TIMEOUT_ENV: &str = "SCRIPTCAST_TEXT_TIMEOUT_SECS";
pub const SPEECH_TIMEOUT_ENV: &str = "SCRIPTCAST_SPEECH_TIMEOUT_SECS";
pub const CLEANUP_ATTEMPTS_ENV: &str = "SCRIPTCAST_CLEANUP_ATTEMPTS";
pub const CLEANUP_DELAY_ENV: &str = "SCRIPTCAST_CLEANUP_DELAY_MS";

pub const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_SPEECH_TIMEOUT: Duration = Duration::from_secs(300);

/// Runtime configuration gathered from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub credentials: HashMap<ProviderFamily, Credential>,
    pub gradio_endpoint: Option<String>,
    pub text_timeout: Duration,
    pub speech_timeout: Duration,
    pub cleanup: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: HashMap::new(),
            gradio_endpoint: None,
            text_timeout: DEFAULT_TEXT_TIMEOUT,
            speech_timeout: DEFAULT_SPEECH_TIMEOUT,
            cleanup: RetryPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let families = [
            ProviderFamily::Gemini,
            ProviderFamily::Groq,
            ProviderFamily::ElevenLabs,
            ProviderFamily::Gradio,
        ];
        let credentials = families
            .into_iter()
            .filter_map(|family| {
                let secret = lookup(family.config().env_var)?;
                Credential::new(secret).map(|credential| (family, credential))
            })
            .collect();

        let defaults = RetryPolicy::default();
        let cleanup = RetryPolicy {
            max_attempts: parse_env::<u32>(&lookup, CLEANUP_ATTEMPTS_ENV)
                .unwrap_or(defaults.max_attempts)
                .max(1),
            delay: parse_env::<u64>(&lookup, CLEANUP_DELAY_ENV)
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
        };

        Self {
            credentials,
            gradio_endpoint: lookup(GRADIO_ENDPOINT_ENV).filter(|v| !v.trim().is_empty()),
            text_timeout: parse_env::<u64>(&lookup, TEXT_TIMEOUT_ENV)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TEXT_TIMEOUT),
            speech_timeout: parse_env::<u64>(&lookup, SPEECH_TIMEOUT_ENV)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SPEECH_TIMEOUT),
            cleanup,
        }
    }

    pub fn with_credential(mut self, family: ProviderFamily, credential: Credential) -> Self {
        self.credentials.insert(family, credential);
        self
    }
}

fn parse_env<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "ignoring unparsable setting");
    }
    parsed
}
