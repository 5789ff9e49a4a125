//! Full sessions through the real registry and adapters, with every
//! upstream service mocked.

use std::{sync::Arc, time::Duration};

use scriptcast_core::{
    Credential, DuckDuckGo, ErrorKind, EventSink, GenerationRequest, PipelineEvent,
    PipelineOrchestrator, PipelineState, ProviderFamily, ProviderRegistry, ScriptOrigin,
    ScriptSession, SpeechProviderRef, Stage, TextProviderRef, UserAction,
    pipeline::{Synthesizer, encode_wav},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "content": content } }],
    }))
}

async fn mount_search(server: &MockServer) {
    let page = r#"<a class="result__snippet" href="/1">Bees are insects.</a>
                  <a class="result__snippet" href="/2">They make honey.</a>"#;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(server)
        .await;
}

async fn mount_chat(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Summarize the following text: Bees are insects. They make honey."))
        .respond_with(completion("Bees are honey-making insects."))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Generate a YouTube script voiceover"))
        .respond_with(completion("Welcome! Today we talk about bees."))
        .mount(server)
        .await;
}

async fn mount_gradio(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/gradio_api/call/synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "e1" })))
        .mount(server)
        .await;
    let stream = format!(
        "event: complete\ndata: [{{\"url\": \"{}/files/voice.wav\"}}]\n\n",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/gradio_api/call/synthesize/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/voice.wav"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(encode_wav(&[0.0, 0.5, -0.5], 24000, 1).unwrap()),
        )
        .mount(server)
        .await;
}

fn request(title: &str) -> GenerationRequest {
    GenerationRequest::new(
        title,
        3,
        TextProviderRef::from_model("llama-3.1-8b-instant"),
        SpeechProviderRef::default(),
    )
}

#[tokio::test]
async fn title_to_script_to_audio_and_back() {
    let server = MockServer::start().await;
    mount_search(&server).await;
    mount_chat(&server).await;
    mount_gradio(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let registry = ProviderRegistry::new()
        .with_credential(ProviderFamily::Groq, Credential::new("groq-key").unwrap())
        .with_base_url(ProviderFamily::Groq, server.uri())
        .with_base_url(ProviderFamily::Gradio, server.uri());
    let search = DuckDuckGo::with_url(format!("{}/html/", server.uri()), TIMEOUT).unwrap();
    let (sink, mut events) = EventSink::channel();
    let mut orchestrator = PipelineOrchestrator::new(Arc::new(registry), Arc::new(search), sink)
        .with_synthesizer(Synthesizer::in_dir(dir.path()));

    let session = orchestrator
        .handle(ScriptSession::new(), UserAction::Submit(request("Bees")))
        .await;
    assert_eq!(session.state, PipelineState::Generated, "{:?}", session.error());
    let script = session.current_script.clone().unwrap();
    assert_eq!(script.content, "Welcome! Today we talk about bees.");
    assert_eq!(script.origin, ScriptOrigin::New);
    assert_eq!(script.source_summary.text(), "Bees are honey-making insects.");
    assert_eq!(script.source_summary.source_count(), 2);

    let session = orchestrator.handle(session, UserAction::Synthesize).await;
    assert_eq!(session.state, PipelineState::AudioReady, "{:?}", session.error());
    let audio = session.audio.clone().unwrap();
    assert_eq!(audio.mime_type, "audio/wav");
    assert_eq!(audio.suggested_filename, "tts_output.wav");
    assert_eq!(std::fs::read(&audio.backing_path).unwrap(), audio.bytes);

    let id = session.id;
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.session_id, id);
        seen.push(event);
    }
    assert!(seen.windows(2).all(|w| w[0].seq < w[1].seq));
    assert!(matches!(
        seen.last().map(|e| &e.event),
        Some(PipelineEvent::AudioReady(_))
    ));

    let session = orchestrator.handle(session, UserAction::Reset).await;
    assert_eq!(session.state, PipelineState::Idle);
    assert!(!audio.backing_path.exists());
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let registry = ProviderRegistry::new().with_base_url(ProviderFamily::Groq, server.uri());
    let search = DuckDuckGo::with_url(format!("{}/html/", server.uri()), TIMEOUT).unwrap();
    let mut orchestrator =
        PipelineOrchestrator::new(Arc::new(registry), Arc::new(search), EventSink::discard());

    let session = orchestrator
        .handle(ScriptSession::new(), UserAction::Submit(request("Bees")))
        .await;

    let (kind, stage, message) = session.error().unwrap();
    assert_eq!(kind, ErrorKind::UnconfiguredProvider);
    assert_eq!(stage, Stage::Resolve);
    assert!(message.contains("GROQ_API_KEY"));

    let session = orchestrator.handle(session, UserAction::Acknowledge).await;
    assert_eq!(session.state, PipelineState::Idle);
}

#[tokio::test]
async fn upstream_failure_during_compose_is_reported_with_its_stage() {
    let server = MockServer::start().await;
    mount_search(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Summarize the following text"))
        .respond_with(completion("A summary."))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Generate a YouTube script voiceover"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let registry = ProviderRegistry::new()
        .with_credential(ProviderFamily::Groq, Credential::new("groq-key").unwrap())
        .with_base_url(ProviderFamily::Groq, server.uri());
    let search = DuckDuckGo::with_url(format!("{}/html/", server.uri()), TIMEOUT).unwrap();
    let mut orchestrator =
        PipelineOrchestrator::new(Arc::new(registry), Arc::new(search), EventSink::discard());

    let session = orchestrator
        .handle(ScriptSession::new(), UserAction::Submit(request("Bees")))
        .await;

    let (kind, stage, message) = session.error().unwrap();
    assert_eq!(kind, ErrorKind::UpstreamGenerationError);
    assert_eq!(stage, Stage::Compose);
    assert!(message.contains("model overloaded"));
    assert!(session.current_script.is_none());
}
