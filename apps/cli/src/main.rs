use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use scriptcast_core::{
    DuckDuckGo, EventSink, PipelineOrchestrator, PipelineState, ProviderRegistry, ResourceJanitor,
    Settings, SpeechProviderRef, TextProviderRef, UserAction,
    provider::{DEFAULT_ELEVENLABS_VOICE, DEFAULT_GRADIO_SPACE, ELEVENLABS_VOICES, TEXT_MODELS},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::{App, RequestDefaults},
    render::Renderer,
};

mod app;
mod render;
mod repl;

#[derive(Clone, Default, ValueEnum)]
enum CliTts {
    /// MeloTTS on a Hugging Face Gradio space (WAV)
    #[default]
    Melo,
    /// ElevenLabs API (MP3)
    Elevenlabs,
}

#[derive(Parser)]
#[command(name = "scriptcast")]
#[command(about = "Research a topic, write a voiceover script with an LLM, and synthesize it")]
struct Cli {
    /// Video title or topic
    title: String,

    /// Target video length in minutes (1-120)
    #[arg(short, long, default_value_t = 3)]
    minutes: u32,

    /// Text model; Gemini models go to Google, the rest to Groq
    #[arg(long, default_value = TEXT_MODELS[0])]
    text_model: String,

    /// Speech provider
    #[arg(short, long, default_value = "melo")]
    tts: CliTts,

    /// ElevenLabs voice name or id
    #[arg(long, default_value = DEFAULT_ELEVENLABS_VOICE)]
    voice: String,

    /// Gradio space ("owner/space") or full URL for MeloTTS
    #[arg(long)]
    gradio_endpoint: Option<String>,

    /// Synthesize the script after generating it
    #[arg(short, long)]
    audio: bool,

    /// Where to save audio (file or directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the session open for regenerate/edit/audio commands
    #[arg(short, long)]
    interactive: bool,
}

impl Cli {
    fn speech_provider(&self, settings: &Settings) -> SpeechProviderRef {
        match self.tts {
            CliTts::Melo => SpeechProviderRef::Gradio {
                endpoint: self
                    .gradio_endpoint
                    .clone()
                    .or_else(|| settings.gradio_endpoint.clone())
                    .unwrap_or_else(|| DEFAULT_GRADIO_SPACE.to_string()),
            },
            CliTts::Elevenlabs => SpeechProviderRef::ElevenLabs {
                voice: self.voice.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriptcast=info,scriptcast_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(endpoint) = &cli.gradio_endpoint {
        settings.gradio_endpoint = Some(endpoint.clone());
    }

    if !TEXT_MODELS.contains(&cli.text_model.as_str()) {
        tracing::warn!(model = %cli.text_model, "model is not in the known list, sending it anyway");
    }
    if matches!(cli.tts, CliTts::Elevenlabs) && !ELEVENLABS_VOICES.contains(&cli.voice.as_str()) {
        tracing::info!(voice = %cli.voice, "voice is not a premade name, treating it as a voice id");
    }

    let registry = ProviderRegistry::from_settings(&settings);
    let search = DuckDuckGo::new(settings.text_timeout)?;
    let (sink, events) = EventSink::channel();
    let orchestrator = PipelineOrchestrator::new(Arc::new(registry), Arc::new(search), sink)
        .with_janitor(ResourceJanitor::new(settings.cleanup));

    let defaults = RequestDefaults {
        target_minutes: cli.minutes,
        text_provider: TextProviderRef::from_model(&cli.text_model),
        speech_provider: cli.speech_provider(&settings),
    };
    let mut app = App::new(orchestrator, Renderer::new(events), defaults, cli.output.clone());

    println!(
        "\n{}  {}\n",
        style("scriptcast").cyan().bold(),
        style("Voiceover Writer").dim()
    );

    let request = app.request_for(cli.title.clone());
    app.dispatch(UserAction::Submit(request)).await;

    if cli.interactive {
        return repl::run(&mut app).await;
    }

    let mut failed = app.session().error().is_some();
    if cli.audio && !failed {
        app.dispatch(UserAction::Synthesize).await;
        if app.session().state == PipelineState::AudioReady {
            app.save_audio(None).await?;
        } else {
            failed = true;
        }
    }

    // Leave no temporary audio behind.
    app.dispatch(UserAction::Reset).await;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
