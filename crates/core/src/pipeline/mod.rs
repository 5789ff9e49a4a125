//! The stages a session moves through, and the orchestrator that drives them.

pub mod compose;
pub mod janitor;
pub mod orchestrator;
pub mod summarize;
pub mod synthesize;

pub use compose::ScriptComposer;
pub use janitor::{CleanupOutcome, FileRemover, FsRemover, ResourceJanitor, RetryPolicy};
pub use orchestrator::{PipelineOrchestrator, UserAction};
pub use summarize::SearchSummarizer;
pub use synthesize::{Synthesizer, encode_wav};
