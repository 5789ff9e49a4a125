//! HTTP adapters against a local mock server: chat completions, ElevenLabs,
//! the Gradio call API and the DuckDuckGo HTML endpoint.

use std::time::Duration;

use scriptcast_core::{
    ChatCompletionsClient, Credential, DuckDuckGo, ErrorKind, ProviderFamily, SearchEngine,
    SpeechSynthesizer, SynthesizedAudio, TextGenerator, AudioFormat,
    pipeline::encode_wav,
    search::SearchQuery,
    tts::{ElevenLabsTts, GradioTts, gradio::MeloVoice},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn key(secret: &str) -> Credential {
    Credential::new(secret).expect("non-empty credential")
}

#[tokio::test]
async fn chat_completion_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer groq-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.1-8b-instant",
            "messages": [{ "role": "user", "content": "Say hi" }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hi!" } }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(
        ProviderFamily::Groq,
        format!("{}/", server.uri()),
        "llama-3.1-8b-instant",
        key("groq-key"),
        TIMEOUT,
    )
    .unwrap();

    assert_eq!(client.generate("Say hi").await.unwrap(), "Hi!");
}

#[tokio::test]
async fn chat_completion_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(
        ProviderFamily::Gemini,
        server.uri(),
        "gemini-1.5-flash",
        key("gemini-key"),
        TIMEOUT,
    )
    .unwrap();

    let err = client.summarize("anything").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamGenerationError);
    let message = err.to_string();
    assert!(message.contains("Gemini"), "{message}");
    assert!(message.contains("429"), "{message}");
    assert!(message.contains("rate limited"), "{message}");
}

#[tokio::test]
async fn chat_completion_without_content_is_an_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(
        ProviderFamily::Groq,
        server.uri(),
        "gemma2-9b-it",
        key("k"),
        TIMEOUT,
    )
    .unwrap();

    let err = client.generate("x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamGenerationError);
}

#[tokio::test]
async fn elevenlabs_resolves_voice_name_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/voices"))
        .and(header("xi-api-key", "xi-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "voices": [
                { "voice_id": "id-laura", "name": "Laura" },
                { "voice_id": "id-sarah", "name": "Sarah" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mp3 = vec![0xFF, 0xFB, 0x90, 0x44, 0x00];
    Mock::given(method("POST"))
        .and(path("/text-to-speech/id-sarah"))
        .and(query_param("output_format", "mp3_44100_128"))
        .and(body_partial_json(json!({ "model_id": "eleven_multilingual_v2" })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mp3.clone()))
        .expect(2)
        .mount(&server)
        .await;

    let tts = ElevenLabsTts::new(server.uri(), "sarah", key("xi-key"), TIMEOUT).unwrap();

    for text in ["First take.", "Second take."] {
        let audio = tts.synthesize(text).await.unwrap();
        assert_eq!(
            audio,
            SynthesizedAudio::Encoded {
                bytes: mp3.clone(),
                format: AudioFormat::Mp3,
            }
        );
    }
}

#[tokio::test]
async fn elevenlabs_rejection_is_a_synthesis_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/voices"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let tts = ElevenLabsTts::new(server.uri(), "Sarah", key("bad"), TIMEOUT).unwrap();
    let err = tts.synthesize("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SynthesisError);
    assert!(err.to_string().contains("401"));
}

async fn mount_gradio_call(server: &MockServer, prefix: &str, wav: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path(format!("{prefix}/call/synthesize")))
        .and(body_partial_json(json!({ "data": ["EN-US", "Hello bees", 1.0, "EN"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "evt-1" })))
        .expect(1)
        .mount(server)
        .await;

    let stream = format!(
        "event: generating\ndata: null\n\nevent: complete\ndata: [{{\"path\": \"/tmp/out.wav\", \"url\": \"{}/files/out.wav\"}}]\n\n",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path(format!("{prefix}/call/synthesize/evt-1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/out.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav))
        .mount(server)
        .await;
}

#[tokio::test]
async fn gradio_call_decodes_the_returned_wav() {
    let server = MockServer::start().await;
    let samples = vec![0.0, 0.5, -0.5, 0.25];
    mount_gradio_call(&server, "/gradio_api", encode_wav(&samples, 44100, 1).unwrap()).await;

    let tts = GradioTts::new(&server.uri(), MeloVoice::default(), None, TIMEOUT).unwrap();
    let audio = tts.synthesize("Hello bees").await.unwrap();

    assert_eq!(
        audio,
        SynthesizedAudio::Samples {
            samples,
            sample_rate: 44100,
            channels: 1,
        }
    );
}

#[tokio::test]
async fn gradio_falls_back_to_root_routes() {
    let server = MockServer::start().await;
    mount_gradio_call(&server, "", encode_wav(&[0.25], 22050, 1).unwrap()).await;

    let tts = GradioTts::new(&server.uri(), MeloVoice::default(), None, TIMEOUT).unwrap();
    let audio = tts.synthesize("Hello bees").await.unwrap();

    assert!(matches!(
        audio,
        SynthesizedAudio::Samples { sample_rate: 22050, .. }
    ));
}

#[tokio::test]
async fn gradio_error_event_is_a_synthesis_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gradio_api/call/synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "evt-2" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gradio_api/call/synthesize/evt-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("event: error\ndata: \"GPU quota exceeded\"\n\n"))
        .mount(&server)
        .await;

    let tts = GradioTts::new(&server.uri(), MeloVoice::default(), None, TIMEOUT).unwrap();
    let err = tts.synthesize("Hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SynthesisError);
    assert!(err.to_string().contains("GPU quota exceeded"));
}

#[tokio::test]
async fn duckduckgo_sends_query_and_parses_snippets() {
    let server = MockServer::start().await;
    let page = r#"
        <div class="result"><a class="result__snippet" href="/1">Bees <b>pollinate</b> crops.</a></div>
        <div class="result"><a class="result__snippet" href="/2">Colonies &amp; hives.</a></div>
    "#;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "honey bees"))
        .and(query_param("kl", "us-en"))
        .and(query_param("df", "m"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .expect(1)
        .mount(&server)
        .await;

    let engine = DuckDuckGo::with_url(format!("{}/html/", server.uri()), TIMEOUT).unwrap();
    let hits = engine.search(&SearchQuery::recent("honey bees")).await.unwrap();

    let bodies: Vec<_> = hits.into_iter().map(|h| h.body).collect();
    assert_eq!(bodies, vec!["Bees pollinate crops.", "Colonies & hives."]);
}

#[tokio::test]
async fn duckduckgo_failure_is_a_search_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine = DuckDuckGo::with_url(server.uri(), TIMEOUT).unwrap();
    let err = engine.search(&SearchQuery::recent("bees")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SearchFailed);
}
