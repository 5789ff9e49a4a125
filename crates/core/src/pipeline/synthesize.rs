use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use crate::{
    error::{Result, ScriptcastError},
    tts::{SpeechSynthesizer, SynthesizedAudio},
    types::{AudioArtifact, AudioFormat, Script},
};

const TEMP_PREFIX: &str = "scriptcast-";

/// Runs speech synthesis and stores the result as a playable file.
#[derive(Clone, Debug, Default)]
pub struct Synthesizer {
    temp_dir: Option<PathBuf>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep transient files under `dir` instead of the OS temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    /// `expected` comes from the selected provider ref; a provider that
    /// answers in another shape is rejected rather than negotiated with.
    pub async fn run(
        &self,
        script: &Script,
        speech_provider: &dyn SpeechSynthesizer,
        expected: AudioFormat,
    ) -> Result<AudioArtifact> {
        tracing::info!(
            provider = speech_provider.provider_name(),
            chars = script.content.len(),
            "synthesizing speech"
        );
        let audio = speech_provider.synthesize(&script.content).await?;

        let bytes = match (audio, expected) {
            (
                SynthesizedAudio::Samples {
                    samples,
                    sample_rate,
                    channels,
                },
                AudioFormat::Wav,
            ) => encode_wav(&samples, sample_rate, channels)?,
            (SynthesizedAudio::Encoded { bytes, format }, expected) if format == expected => bytes,
            (other, expected) => {
                let got = match other {
                    SynthesizedAudio::Samples { .. } => "decoded samples".to_string(),
                    SynthesizedAudio::Encoded { format, .. } => {
                        format!("{} stream", format.extension())
                    }
                };
                return Err(ScriptcastError::UnsupportedProvider {
                    provider_name: speech_provider.provider_name().to_string(),
                    reason: format!("expected {} output, got {got}", expected.extension()),
                });
            }
        };

        let backing_path = self.store(&bytes, expected).await?;
        tracing::debug!(path = %backing_path.display(), bytes = bytes.len(), "stored audio");

        Ok(AudioArtifact {
            bytes,
            format: expected,
            mime_type: expected.mime_type().to_string(),
            suggested_filename: expected.suggested_filename(),
            backing_path,
        })
    }

    async fn store(&self, bytes: &[u8], format: AudioFormat) -> Result<PathBuf> {
        let suffix = format!(".{}", format.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(&suffix);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (_handle, path) = file.keep().map_err(|e| e.error)?;

        if let Err(e) = tokio::fs::write(&path, bytes).await {
            discard(&path);
            return Err(e.into());
        }
        Ok(path)
    }
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::debug!(path = %path.display(), error = %e, "could not remove partial file");
    }
}

/// Encodes float samples as 32-bit IEEE float WAV, which keeps every
/// sample bit-exact.
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: channels.max(1),
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{error::ErrorKind, tts::gradio::decode_wav, types::{ScriptOrigin, Summary}};

    struct Fixed(SynthesizedAudio);

    #[async_trait]
    impl SpeechSynthesizer for Fixed {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        async fn synthesize(&self, _text: &str) -> Result<SynthesizedAudio> {
            Ok(self.0.clone())
        }
    }

    fn script(content: &str) -> Script {
        Script {
            content: content.to_string(),
            origin: ScriptOrigin::New,
            source_summary: Summary::new("s", "q", 1),
        }
    }

    #[tokio::test]
    async fn samples_round_trip_through_wav() {
        let dir = tempfile::tempdir().unwrap();
        let samples = vec![0.1, -0.3, 0.123456, 1.0, -1.0, 0.0, 1.0e-7];
        let provider = Fixed(SynthesizedAudio::Samples {
            samples: samples.clone(),
            sample_rate: 44100,
            channels: 1,
        });

        let artifact = Synthesizer::in_dir(dir.path())
            .run(&script("hello"), &provider, AudioFormat::Wav)
            .await
            .unwrap();

        assert_eq!(artifact.mime_type, "audio/wav");
        assert_eq!(artifact.suggested_filename, "tts_output.wav");
        assert_eq!(
            artifact.backing_path.extension().and_then(|e| e.to_str()),
            Some("wav")
        );
        assert_eq!(std::fs::read(&artifact.backing_path).unwrap(), artifact.bytes);

        let decoded = decode_wav(&artifact.bytes).unwrap();
        assert_eq!(
            decoded,
            SynthesizedAudio::Samples {
                samples,
                sample_rate: 44100,
                channels: 1,
            }
        );
    }

    #[test]
    fn wav_keeps_arbitrary_stereo_samples_exact() {
        let samples = [0.1, -0.3, 0.123456, 1.0, 0.987654, -0.000031];
        let bytes = encode_wav(&samples, 22050, 2).unwrap();

        let SynthesizedAudio::Samples {
            samples: decoded,
            sample_rate,
            channels,
        } = decode_wav(&bytes).unwrap()
        else {
            panic!("expected decoded samples");
        };
        assert_eq!(decoded, samples);
        assert_eq!(sample_rate, 22050);
        assert_eq!(channels, 2);
    }

    #[tokio::test]
    async fn encoded_stream_is_stored_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let mp3 = vec![0xFF, 0xFB, 0x90, 0x00, 1, 2, 3];
        let provider = Fixed(SynthesizedAudio::Encoded {
            bytes: mp3.clone(),
            format: AudioFormat::Mp3,
        });

        let artifact = Synthesizer::in_dir(dir.path())
            .run(&script(""), &provider, AudioFormat::Mp3)
            .await
            .unwrap();

        assert_eq!(artifact.bytes, mp3);
        assert_eq!(artifact.mime_type, "audio/mpeg");
        assert_eq!(artifact.suggested_filename, "tts_output.mp3");
        assert_eq!(std::fs::read(&artifact.backing_path).unwrap(), mp3);
    }

    #[tokio::test]
    async fn mismatched_shape_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Fixed(SynthesizedAudio::Samples {
            samples: vec![0.0],
            sample_rate: 8000,
            channels: 1,
        });

        let err = Synthesizer::in_dir(dir.path())
            .run(&script("x"), &provider, AudioFormat::Mp3)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedProvider);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
