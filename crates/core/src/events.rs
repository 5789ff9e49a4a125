use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{ErrorKind, ScriptcastError},
    types::{AudioArtifact, Script, Summary},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stage {
    Validate,
    Resolve,
    Search,
    Summarize,
    Compose,
    Synthesize,
    Session,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Resolve => "resolve",
            Stage::Search => "search",
            Stage::Summarize => "summarize",
            Stage::Compose => "compose",
            Stage::Synthesize => "synthesize",
            Stage::Session => "session",
        }
    }
}

/// What the orchestrator tells the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum PipelineEvent {
    Progress {
        stage: Stage,
        percent: u8,
    },
    SummaryReady(Summary),
    TextReady(Script),
    AudioReady(AudioArtifact),
    Failed {
        kind: ErrorKind,
        stage: Stage,
        message: String,
    },
}

impl PipelineEvent {
    pub fn failed(stage: Stage, err: &ScriptcastError) -> Self {
        PipelineEvent::Failed {
            kind: err.kind(),
            stage,
            message: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EnrichedEvent {
    pub event: PipelineEvent,
    pub session_id: Uuid,
    pub seq: u64,
    pub timestamp: SystemTime,
}

/// Stamps events with the session id and an increasing sequence number and
/// hands them to whoever renders them. A gone receiver is not an error.
#[derive(Clone)]
pub struct EventSink {
    inner: Arc<EventSinkInner>,
}

struct EventSinkInner {
    next_seq: AtomicU64,
    tx: Option<mpsc::UnboundedSender<EnrichedEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EnrichedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            inner: Arc::new(EventSinkInner {
                next_seq: AtomicU64::new(0),
                tx: Some(tx),
            }),
        };
        (sink, rx)
    }

    /// A sink that drops everything.
    pub fn discard() -> Self {
        Self {
            inner: Arc::new(EventSinkInner {
                next_seq: AtomicU64::new(0),
                tx: None,
            }),
        }
    }

    pub fn publish(&self, session_id: Uuid, event: PipelineEvent) {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let Some(tx) = &self.inner.tx else {
            return;
        };

        let enriched = EnrichedEvent {
            event,
            session_id,
            seq,
            timestamp: SystemTime::now(),
        };
        if tx.send(enriched).is_err() {
            tracing::trace!(seq, "event receiver dropped");
        }
    }
}
