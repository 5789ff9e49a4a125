use std::{fmt, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::ErrorKind,
    events::Stage,
    llm::TextGenerator,
    tts::SpeechSynthesizer,
    types::{AudioArtifact, GenerationRequest, Script},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Empty,
    Generated,
    Regenerated,
    Edited,
}

/// Where the orchestrator is. Transient states are visible only while a
/// call is in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Summarizing,
    Composing,
    Generated,
    Regenerated,
    Edited,
    Synthesizing,
    AudioReady,
    Error {
        kind: ErrorKind,
        stage: Stage,
        message: String,
        /// State restored on acknowledgement.
        resume: Box<PipelineState>,
    },
}

impl PipelineState {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Summarizing => "summarizing",
            PipelineState::Composing => "composing",
            PipelineState::Generated => "generated",
            PipelineState::Regenerated => "regenerated",
            PipelineState::Edited => "edited",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::AudioReady => "audio ready",
            PipelineState::Error { .. } => "in error",
        }
    }

    /// True when a script exists and can be edited, regenerated or voiced.
    pub fn has_script(&self) -> bool {
        matches!(
            self,
            PipelineState::Generated
                | PipelineState::Regenerated
                | PipelineState::Edited
                | PipelineState::AudioReady
        )
    }
}

/// Adapters resolved once per submitted request.
#[derive(Clone)]
pub struct ResolvedProviders {
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl fmt::Debug for ResolvedProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProviders")
            .field("text", &self.text.provider_name())
            .field("speech", &self.speech.provider_name())
            .finish()
    }
}

/// Everything one user session has produced so far. The presentation layer
/// owns it and threads it through [`crate::PipelineOrchestrator::handle`].
#[derive(Clone, Debug)]
pub struct ScriptSession {
    pub id: Uuid,
    pub state: PipelineState,
    pub status: SessionStatus,
    pub current_script: Option<Script>,
    pub request: Option<GenerationRequest>,
    pub providers: Option<ResolvedProviders>,
    pub audio: Option<AudioArtifact>,
}

impl Default for ScriptSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: PipelineState::Idle,
            status: SessionStatus::Empty,
            current_script: None,
            request: None,
            providers: None,
            audio: None,
        }
    }

    pub fn error(&self) -> Option<(ErrorKind, Stage, &str)> {
        match &self.state {
            PipelineState::Error {
                kind,
                stage,
                message,
                ..
            } => Some((*kind, *stage, message.as_str())),
            _ => None,
        }
    }
}
