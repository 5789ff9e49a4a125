use crate::{
    error::Result,
    llm::TextGenerator,
    types::{Script, ScriptOrigin, Summary},
};

pub const REGENERATION_NOTE: &str = " (This is a regenerated script.)";

/// Turns a researched summary into a voiceover script.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptComposer;

impl ScriptComposer {
    pub fn new() -> Self {
        Self
    }

    /// The instruction sent to the model. Identical inputs give identical
    /// prompts; regeneration only appends [`REGENERATION_NOTE`].
    pub fn build_prompt(
        title: &str,
        summary: &Summary,
        target_minutes: u32,
        is_regeneration: bool,
    ) -> String {
        let regenerate_note = if is_regeneration { REGENERATION_NOTE } else { "" };
        format!(
            r#"Generate a YouTube script voiceover based on the following title and context. Make it sound like a natural conversation, with pauses and a conversational tone.

Title: {title}

Context: {context}

The voiceover should be suitable for a video that is approximately {target_minutes} minutes long. It should start with a strong introduction, followed by key points that highlight the main aspects of the topic, and conclude with a statement that leaves the viewer wanting to learn more.

Only provide the voiceover text, without any additional formatting or instructions.{regenerate_note}"#,
            context = summary.text(),
        )
    }

    pub async fn run(
        &self,
        title: &str,
        summary: Summary,
        target_minutes: u32,
        is_regeneration: bool,
        text_provider: &dyn TextGenerator,
    ) -> Result<Script> {
        let prompt = Self::build_prompt(title, &summary, target_minutes, is_regeneration);
        tracing::info!(title, target_minutes, is_regeneration, provider = text_provider.provider_name(), "composing script");

        let content = text_provider.generate(&prompt).await?;
        let origin = if is_regeneration {
            ScriptOrigin::Regenerated
        } else {
            ScriptOrigin::New
        };

        Ok(Script {
            content,
            origin,
            source_summary: summary,
        })
    }
}
