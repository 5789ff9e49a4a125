use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use scriptcast_core::{
    EnrichedEvent, PipelineEvent, PipelineOrchestrator, ScriptSession, Stage, UserAction,
    format_duration, format_script_readable,
};
use tokio::sync::mpsc::UnboundedReceiver;

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn running_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Search => "Searching the web...",
        Stage::Summarize => "Summarizing sources...",
        Stage::Compose => "Writing script...",
        Stage::Synthesize => "Synthesizing voiceover...",
        Stage::Validate | Stage::Resolve | Stage::Session => "Working...",
    }
}

fn done_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Search => "Searched",
        Stage::Summarize => "Summarized",
        Stage::Compose => "Script written",
        Stage::Synthesize => "Voiceover synthesized",
        Stage::Validate | Stage::Resolve | Stage::Session => "Done",
    }
}

struct Step {
    stage: Stage,
    spinner: ProgressBar,
    started: Instant,
}

/// Prints pipeline events as they arrive.
pub struct Renderer {
    events: UnboundedReceiver<EnrichedEvent>,
    step: Option<Step>,
}

impl Renderer {
    pub fn new(events: UnboundedReceiver<EnrichedEvent>) -> Self {
        Self { events, step: None }
    }

    /// Runs one action while rendering the events it publishes.
    pub async fn run(
        &mut self,
        orchestrator: &mut PipelineOrchestrator,
        session: ScriptSession,
        action: UserAction,
    ) -> ScriptSession {
        let work = orchestrator.handle(session, action);
        tokio::pin!(work);

        loop {
            tokio::select! {
                session = &mut work => {
                    while let Ok(event) = self.events.try_recv() {
                        self.show(event);
                    }
                    return session;
                }
                Some(event) = self.events.recv() => self.show(event),
            }
        }
    }

    fn show(&mut self, enriched: EnrichedEvent) {
        tracing::debug!(seq = enriched.seq, session = %enriched.session_id, "event");
        match enriched.event {
            PipelineEvent::Progress { stage, percent } => {
                if percent >= 100 {
                    self.finish(None);
                } else if self.step.as_ref().map(|s| s.stage) != Some(stage) {
                    self.finish(None);
                    self.step = Some(Step {
                        stage,
                        spinner: create_spinner(running_message(stage)),
                        started: Instant::now(),
                    });
                }
            }
            PipelineEvent::SummaryReady(summary) => {
                self.finish(Some(format!("from {} sources", summary.source_count())));
            }
            PipelineEvent::TextReady(script) => {
                self.finish(None);
                println!("{}", style("─".repeat(60)).dim());
                println!(
                    "{}",
                    format_script_readable(script.source_summary.query(), &script)
                );
                println!("{}", style("─".repeat(60)).dim());
            }
            PipelineEvent::AudioReady(artifact) => {
                self.finish(None);
                println!(
                    "{} Audio ready: {} {}",
                    style("✓").green().bold(),
                    style(&artifact.mime_type).yellow(),
                    style(format!("({} KB)", artifact.bytes.len() / 1024)).dim()
                );
            }
            PipelineEvent::Failed {
                kind,
                stage,
                message,
            } => {
                if let Some(step) = self.step.take() {
                    step.spinner.abandon_with_message(format!(
                        "{} {}",
                        style("✗").red().bold(),
                        running_message(step.stage)
                    ));
                }
                eprintln!(
                    "{} {} {}",
                    style("Error:").red().bold(),
                    message,
                    style(format!("[{} / {:?}]", stage.label(), kind)).dim()
                );
            }
        }
    }

    fn finish(&mut self, detail: Option<String>) {
        let Some(step) = self.step.take() else {
            return;
        };
        let detail = detail.map(|d| format!(" {d}")).unwrap_or_default();
        step.spinner.finish_with_message(format!(
            "{} {}{} {}",
            style("✓").green().bold(),
            done_message(step.stage),
            detail,
            style(format!("[{}]", format_duration(step.started.elapsed()))).dim()
        ));
    }
}
