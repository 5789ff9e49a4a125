use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use scriptcast_core::{
    AudioArtifact, GenerationRequest, PipelineOrchestrator, ScriptSession, SpeechProviderRef,
    TextProviderRef, UserAction,
};

use crate::render::Renderer;

/// Settings every request in this run shares; only the title varies.
#[derive(Clone, Debug)]
pub struct RequestDefaults {
    pub target_minutes: u32,
    pub text_provider: TextProviderRef,
    pub speech_provider: SpeechProviderRef,
}

pub struct App {
    orchestrator: PipelineOrchestrator,
    renderer: Renderer,
    session: ScriptSession,
    defaults: RequestDefaults,
    output: Option<PathBuf>,
}

impl App {
    pub fn new(
        orchestrator: PipelineOrchestrator,
        renderer: Renderer,
        defaults: RequestDefaults,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            renderer,
            session: ScriptSession::new(),
            defaults,
            output,
        }
    }

    pub fn session(&self) -> &ScriptSession {
        &self.session
    }

    pub fn request_for(&self, title: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(
            title,
            self.defaults.target_minutes,
            self.defaults.text_provider.clone(),
            self.defaults.speech_provider.clone(),
        )
    }

    pub async fn dispatch(&mut self, action: UserAction) {
        let session = std::mem::take(&mut self.session);
        self.session = self
            .renderer
            .run(&mut self.orchestrator, session, action)
            .await;
    }

    /// Writes the session's audio to `path`, or to the configured output,
    /// or to the download directory.
    pub async fn save_audio(&self, path: Option<&Path>) -> Result<PathBuf> {
        let artifact = self
            .session
            .audio
            .as_ref()
            .context("No audio has been synthesized yet")?;
        let target = output_path(path.or(self.output.as_deref()), artifact);

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, &artifact.bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;

        println!(
            "{} {}",
            style("Saved:").dim(),
            style(target.display()).cyan()
        );
        Ok(target)
    }
}

pub fn output_path(requested: Option<&Path>, artifact: &AudioArtifact) -> PathBuf {
    match requested {
        Some(path) if path.is_dir() => path.join(&artifact.suggested_filename),
        Some(path) => path.to_path_buf(),
        None => dirs::download_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(&artifact.suggested_filename),
    }
}

#[cfg(test)]
mod tests {
    use scriptcast_core::AudioFormat;

    use super::*;

    fn artifact() -> AudioArtifact {
        AudioArtifact {
            bytes: vec![1, 2, 3],
            format: AudioFormat::Mp3,
            mime_type: AudioFormat::Mp3.mime_type().to_string(),
            suggested_filename: AudioFormat::Mp3.suggested_filename(),
            backing_path: PathBuf::from("/tmp/scriptcast-x.mp3"),
        }
    }

    #[test]
    fn directories_get_the_suggested_filename() {
        let dir = std::env::temp_dir();
        assert_eq!(
            output_path(Some(&dir), &artifact()),
            dir.join("tts_output.mp3")
        );
    }

    #[test]
    fn explicit_files_are_used_as_is() {
        let file = Path::new("voiceover-final.mp3");
        assert_eq!(output_path(Some(file), &artifact()), file.to_path_buf());
    }

    #[test]
    fn default_location_ends_with_suggested_filename() {
        assert!(output_path(None, &artifact()).ends_with("tts_output.mp3"));
    }
}
