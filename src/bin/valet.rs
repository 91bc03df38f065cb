//! Interactive assistant binary.
//!
//! Collaborators are constructed once here and passed into the routers
//! and session controller — no process-wide singletons. Tracing goes to
//! stderr so stdout stays a clean conversation surface.

use std::sync::Arc;
use tracing::warn;
use valet::automation::{AutomationRouter, InputSynth};
use valet::code_assistant::CodeAssistant;
use valet::config::{AssistantConfig, StartupInputMode};
use valet::dispatch::CommandProcessor;
use valet::launcher::LauncherRouter;
use valet::listen::VoiceInput;
use valet::llm::LlmClient;
use valet::memory::ConversationStore;
use valet::platform::{
    CommandProcessHost, CommandVoiceInput, DesktopInput, NullSynthesizer, NullVoiceInput,
    ShellScreenCapture, ShellSynthesizer, TesseractOcr, Unavailable,
};
use valet::session::SessionController;
use valet::speech::{SpeechService, Synthesizer};
use valet::text_input::TextInputSource;
use valet::vision::{Ocr, ScreenCapture, VisionRouter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = AssistantConfig::default_config_path();
    let mut config = if config_path.exists() {
        AssistantConfig::from_file(&config_path)?
    } else {
        AssistantConfig::default()
    };

    // Voice mode needs a recognition backend; fall back to text input
    // rather than listening to nothing.
    let voice: Box<dyn VoiceInput> = match config.voice.stt_command.clone() {
        Some(command) => Box::new(CommandVoiceInput::new(command)),
        None => {
            if config.session.input_mode == StartupInputMode::Voice {
                warn!("no speech recognition command configured; starting in text mode");
                config.session.input_mode = StartupInputMode::Text;
            }
            Box::new(NullVoiceInput)
        }
    };

    let host = Arc::new(CommandProcessHost);
    let input: Arc<dyn InputSynth> = match DesktopInput::new() {
        Ok(input) => Arc::new(input),
        Err(e) => {
            warn!("{e}");
            Arc::new(Unavailable::input())
        }
    };
    let screen: Arc<dyn ScreenCapture> = match ShellScreenCapture::new() {
        Ok(capture) => Arc::new(capture),
        Err(e) => {
            warn!("{e}");
            Arc::new(Unavailable::capture())
        }
    };
    let ocr: Arc<dyn Ocr> = match TesseractOcr::new() {
        Ok(ocr) => Arc::new(ocr),
        Err(e) => {
            warn!("{e}");
            Arc::new(Unavailable::ocr())
        }
    };
    let synthesizer: Arc<dyn Synthesizer> = match ShellSynthesizer::new() {
        Ok(synth) => Arc::new(synth),
        Err(e) => {
            warn!("{e}");
            Arc::new(NullSynthesizer)
        }
    };

    let llm = LlmClient::new(&config.llm);
    let store = Arc::new(ConversationStore::new(&config.db_path())?);

    let processor = CommandProcessor::new(
        CodeAssistant::new(config.workspace.clone(), llm.clone(), host.clone()),
        LauncherRouter::new(host, input.clone()),
        AutomationRouter::new(input),
        VisionRouter::new(screen, ocr, llm.clone()),
    )?;

    let speech = SpeechService::spawn(synthesizer);
    let text = TextInputSource::spawn();

    let mut session =
        SessionController::new(config, processor, llm, store, speech, voice, text);
    session.run().await?;
    Ok(())
}
