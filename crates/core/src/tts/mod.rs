pub mod elevenlabs;
pub mod gradio;

use async_trait::async_trait;

pub use elevenlabs::ElevenLabsTts;
pub use gradio::GradioTts;

use crate::{error::Result, types::AudioFormat};

/// Raw output of a speech backend, before it is stored.
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesizedAudio {
    /// Decoded PCM samples in `[-1.0, 1.0]`, interleaved when `channels > 1`.
    Samples {
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
    },
    /// Bytes already wrapped in a playable container.
    Encoded { bytes: Vec<u8>, format: AudioFormat },
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}
