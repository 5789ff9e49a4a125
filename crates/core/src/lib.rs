//! Research a topic, have an LLM write a narration script for it, and turn
//! the script into a voiceover.
//!
//! [`PipelineOrchestrator`] owns the flow; [`ScriptSession`] carries what a
//! user has produced between actions.

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod llm;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod search;
pub mod session;
pub mod tts;
pub mod types;

pub use config::Settings;
pub use error::{ErrorKind, Result, ScriptcastError};
pub use events::{EnrichedEvent, EventSink, PipelineEvent, Stage};
pub use format::{format_duration, format_script_readable, format_timestamp};
pub use llm::{ChatCompletionsClient, TextGenerator};
pub use pipeline::{PipelineOrchestrator, ResourceJanitor, RetryPolicy, UserAction};
pub use provider::{Credential, ProviderFamily, SpeechProviderRef, TextProviderRef};
pub use registry::{ProviderRegistry, ProviderResolver};
pub use search::{DuckDuckGo, SearchEngine};
pub use session::{PipelineState, ScriptSession, SessionStatus};
pub use tts::{SpeechSynthesizer, SynthesizedAudio};
pub use types::{AudioArtifact, AudioFormat, GenerationRequest, Script, ScriptOrigin, Summary};
