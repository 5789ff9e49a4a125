use std::sync::Arc;

use crate::{
    error::{Result, ScriptcastError},
    events::{EventSink, PipelineEvent, Stage},
    pipeline::{ResourceJanitor, ScriptComposer, SearchSummarizer, Synthesizer},
    registry::ProviderResolver,
    search::SearchEngine,
    session::{PipelineState, ResolvedProviders, ScriptSession, SessionStatus},
    types::{GenerationRequest, Script},
};

/// What the presentation layer asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    Submit(GenerationRequest),
    Regenerate,
    Edit(String),
    Synthesize,
    Reset,
    Acknowledge,
}

impl UserAction {
    pub fn label(&self) -> &'static str {
        match self {
            UserAction::Submit(_) => "submit",
            UserAction::Regenerate => "regenerate",
            UserAction::Edit(_) => "edit",
            UserAction::Synthesize => "synthesize",
            UserAction::Reset => "reset",
            UserAction::Acknowledge => "acknowledge",
        }
    }
}

/// Drives one session through search, script writing and synthesis.
pub struct PipelineOrchestrator {
    resolver: Arc<dyn ProviderResolver>,
    summarizer: SearchSummarizer,
    composer: ScriptComposer,
    synthesizer: Synthesizer,
    janitor: ResourceJanitor,
    events: EventSink,
}

impl PipelineOrchestrator {
    pub fn new(
        resolver: Arc<dyn ProviderResolver>,
        search: Arc<dyn SearchEngine>,
        events: EventSink,
    ) -> Self {
        Self {
            resolver,
            summarizer: SearchSummarizer::new(search),
            composer: ScriptComposer::new(),
            synthesizer: Synthesizer::new(),
            janitor: ResourceJanitor::default(),
            events,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_janitor(mut self, janitor: ResourceJanitor) -> Self {
        self.janitor = janitor;
        self
    }

    pub fn janitor(&self) -> &ResourceJanitor {
        &self.janitor
    }

    /// Applies one action and returns the updated session. Failures are
    /// recorded in the session state and published, never returned.
    #[tracing::instrument(skip_all, fields(session = %session.id, action = action.label()))]
    pub async fn handle(&mut self, mut session: ScriptSession, action: UserAction) -> ScriptSession {
        if action == UserAction::Reset {
            return self.reset(session).await;
        }

        if let PipelineState::Error { resume, .. } = &session.state {
            session.state = (**resume).clone();
            if action == UserAction::Acknowledge {
                return session;
            }
        }

        match action {
            UserAction::Submit(request) => self.submit(session, request).await,
            UserAction::Regenerate if session.state.has_script() => self.regenerate(session).await,
            UserAction::Edit(text) if session.state.has_script() => self.edit(session, text),
            UserAction::Synthesize if session.state.has_script() => self.synthesize(session).await,
            UserAction::Acknowledge => session,
            other => {
                let err = ScriptcastError::InvalidTransition {
                    action: other.label(),
                    state: session.state.label(),
                };
                tracing::debug!(%err, "ignored action");
                self.emit(&session, PipelineEvent::failed(Stage::Session, &err));
                session
            }
        }
    }

    async fn reset(&mut self, session: ScriptSession) -> ScriptSession {
        if let Some(outcome) = self.janitor.flush().await {
            tracing::debug!(?outcome, "flushed pending audio");
        }
        tracing::info!(session = %session.id, "session reset");
        ScriptSession::new()
    }

    async fn submit(&mut self, session: ScriptSession, request: GenerationRequest) -> ScriptSession {
        if let Err(err) = request.validate() {
            let resume = session.state.clone();
            return self.fail(session, Stage::Validate, err, resume);
        }

        // A new request starts from a clean slate.
        let mut session = self.reset(session).await;
        tracing::info!(session = %session.id, title = request.title(), minutes = request.target_minutes(), "generation requested");

        let providers = match self.resolve(&request) {
            Ok(providers) => providers,
            Err(err) => return self.fail(session, Stage::Resolve, err, PipelineState::Idle),
        };

        match self.generate(&mut session, &request, &providers, false).await {
            Ok(script) => {
                session.current_script = Some(script.clone());
                session.request = Some(request);
                session.providers = Some(providers);
                session.status = SessionStatus::Generated;
                session.state = PipelineState::Generated;
                self.emit(&session, PipelineEvent::TextReady(script));
                session
            }
            Err((stage, err)) => self.fail(session, stage, err, PipelineState::Idle),
        }
    }

    async fn regenerate(&mut self, mut session: ScriptSession) -> ScriptSession {
        let prior = session.state.clone();
        let (Some(request), Some(providers)) = (session.request.clone(), session.providers.clone())
        else {
            let err = ScriptcastError::InvalidTransition {
                action: "regenerate",
                state: "without a submitted request",
            };
            return self.fail(session, Stage::Session, err, prior);
        };

        match self.generate(&mut session, &request, &providers, true).await {
            Ok(script) => {
                session.current_script = Some(script.clone());
                session.status = SessionStatus::Regenerated;
                session.state = PipelineState::Regenerated;
                self.emit(&session, PipelineEvent::TextReady(script));
                session
            }
            Err((stage, err)) => self.fail(session, stage, err, prior),
        }
    }

    fn edit(&mut self, mut session: ScriptSession, text: String) -> ScriptSession {
        let Some(current) = &session.current_script else {
            return session;
        };
        let script = current.edited(text);
        session.current_script = Some(script.clone());
        session.status = SessionStatus::Edited;
        session.state = PipelineState::Edited;
        self.emit(&session, PipelineEvent::TextReady(script));
        session
    }

    async fn synthesize(&mut self, mut session: ScriptSession) -> ScriptSession {
        let prior = session.state.clone();
        let (Some(script), Some(request), Some(providers)) = (
            session.current_script.clone(),
            session.request.clone(),
            session.providers.clone(),
        ) else {
            let err = ScriptcastError::InvalidTransition {
                action: "synthesize",
                state: "without a submitted request",
            };
            return self.fail(session, Stage::Session, err, prior);
        };

        session.state = PipelineState::Synthesizing;
        self.progress(&session, Stage::Synthesize, 0);

        let expected = request.speech_provider().output_format();
        match self
            .synthesizer
            .run(&script, providers.speech.as_ref(), expected)
            .await
        {
            Ok(artifact) => {
                // The previous file goes only once its replacement exists.
                self.janitor
                    .schedule_cleanup(artifact.backing_path.clone())
                    .await;
                session.audio = Some(artifact.clone());
                session.state = PipelineState::AudioReady;
                self.progress(&session, Stage::Synthesize, 100);
                self.emit(&session, PipelineEvent::AudioReady(artifact));
                session
            }
            Err(err) => self.fail(session, Stage::Synthesize, err, prior),
        }
    }

    fn resolve(&self, request: &GenerationRequest) -> Result<ResolvedProviders> {
        Ok(ResolvedProviders {
            text: self.resolver.resolve_text_provider(request.text_provider())?,
            speech: self.resolver.resolve_speech_provider(request.speech_provider())?,
        })
    }

    /// Search, summarize, compose. Stops at the first failing stage.
    async fn generate(
        &self,
        session: &mut ScriptSession,
        request: &GenerationRequest,
        providers: &ResolvedProviders,
        is_regeneration: bool,
    ) -> std::result::Result<Script, (Stage, ScriptcastError)> {
        let text = providers.text.as_ref();

        session.state = PipelineState::Summarizing;
        self.progress(session, Stage::Search, 0);
        let bodies = self
            .summarizer
            .search(request.title())
            .await
            .map_err(|e| (Stage::Search, e))?;

        self.progress(session, Stage::Summarize, 30);
        let summary = self
            .summarizer
            .summarize(request.title(), &bodies, text)
            .await
            .map_err(|e| (Stage::Summarize, e))?;
        self.emit(session, PipelineEvent::SummaryReady(summary.clone()));

        session.state = PipelineState::Composing;
        self.progress(session, Stage::Compose, 60);
        let script = self
            .composer
            .run(
                request.title(),
                summary,
                request.target_minutes(),
                is_regeneration,
                text,
            )
            .await
            .map_err(|e| (Stage::Compose, e))?;

        self.progress(session, Stage::Compose, 100);
        Ok(script)
    }

    fn fail(
        &self,
        mut session: ScriptSession,
        stage: Stage,
        err: ScriptcastError,
        resume: PipelineState,
    ) -> ScriptSession {
        tracing::warn!(session = %session.id, stage = stage.label(), kind = ?err.kind(), "{err}");
        self.emit(&session, PipelineEvent::failed(stage, &err));
        session.state = PipelineState::Error {
            kind: err.kind(),
            stage,
            message: err.to_string(),
            resume: Box::new(resume),
        };
        session
    }

    fn progress(&self, session: &ScriptSession, stage: Stage, percent: u8) {
        self.emit(session, PipelineEvent::Progress { stage, percent });
    }

    fn emit(&self, session: &ScriptSession, event: PipelineEvent) {
        self.events.publish(session.id, event);
    }
}
