//! Session controller: the read-classify-dispatch-respond loop.
//!
//! Owns the mutable session state and drives everything else. The loop
//! is single-flight by construction: it blocks on the next input source
//! and does not poll again until the previous command's response has
//! been fully printed and, in voice mode, spoken or cancelled.

mod state;

pub use state::{InputMode, SessionState, SpeedMode};

use crate::config::AssistantConfig;
use crate::dispatch::{CommandProcessor, DispatchOutcome, DispatchResult};
use crate::error::Result;
use crate::intent::{ControlCommand, ModeSwitch};
use crate::listen::{ListenOutcome, VoiceInput};
use crate::llm::{LLM_UNAVAILABLE_MESSAGE, LlmClient};
use crate::memory::ConversationStore;
use crate::speech::SpeechService;
use crate::text_input::TextInputSource;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Poll interval for the text-input queue.
const TEXT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause after cancelling speech before listening again.
const STOP_PAUSE: Duration = Duration::from_secs(2);
/// How long an interactive configuration prompt waits for a line.
const PROMPT_TIMEOUT: Duration = Duration::from_secs(30);
/// Token channel capacity for streaming chat responses.
const STREAM_CHANNEL_SIZE: usize = 64;

/// The main session loop and its state.
pub struct SessionController {
    config: AssistantConfig,
    state: SessionState,
    processor: CommandProcessor,
    llm: LlmClient,
    store: Arc<ConversationStore>,
    speech: SpeechService,
    voice: Box<dyn VoiceInput>,
    text: TextInputSource,
}

impl SessionController {
    /// Wire up a session from its collaborators.
    pub fn new(
        config: AssistantConfig,
        processor: CommandProcessor,
        llm: LlmClient,
        store: Arc<ConversationStore>,
        speech: SpeechService,
        voice: Box<dyn VoiceInput>,
        text: TextInputSource,
    ) -> Self {
        let speed = if config.session.memory_enabled {
            SpeedMode::Memory
        } else {
            SpeedMode::Fast
        };
        let state = SessionState::new(config.session.input_mode.into(), speed);
        Self {
            config,
            state,
            processor,
            llm,
            store,
            speech,
            voice,
            text,
        }
    }

    /// Current session state (read-only).
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current configuration (timing may change at runtime).
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Run the session until `exit`, Ctrl-C, or a termination signal.
    ///
    /// # Errors
    ///
    /// Only startup-time failures are returned; once the loop is running,
    /// everything is caught and reported in-conversation.
    pub async fn run(&mut self) -> Result<()> {
        self.banner();
        let greeting = self.greeting();
        if self.state.input_mode == InputMode::Voice {
            self.speech.speak(&greeting).await;
        }

        loop {
            let (utterance, interrupted) = {
                let next = self.next_utterance();
                tokio::pin!(next);
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => (None, true),
                    utterance = &mut next => (utterance, false),
                }
            };
            if interrupted {
                info!("interrupt signal received");
                break;
            }
            let Some(utterance) = utterance else {
                continue;
            };
            if !self.handle(&utterance).await {
                break;
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Block until the next utterance arrives on the active input source.
    ///
    /// Returns `None` for timeouts, unintelligible audio, and empty text
    /// polls — the loop just continues.
    async fn next_utterance(&mut self) -> Option<String> {
        match self.state.input_mode {
            InputMode::Text => match self.text.poll() {
                Some(line) if !line.is_empty() => {
                    println!("You typed: {line}");
                    Some(line)
                }
                _ => {
                    tokio::time::sleep(TEXT_POLL_INTERVAL).await;
                    None
                }
            },
            InputMode::Voice => match self.voice.listen(&self.config.voice).await {
                ListenOutcome::Heard(text) => {
                    self.state.record_success();
                    println!("You said: {text}");
                    Some(text)
                }
                ListenOutcome::Unintelligible => {
                    let max = self.config.voice.max_consecutive_failures;
                    if self.state.record_failure(max) {
                        let cooldown = self.config.voice.failure_cooldown_secs;
                        println!(
                            "Too many recognition failures. Taking a {cooldown} second break..."
                        );
                        tokio::time::sleep(Duration::from_secs(cooldown)).await;
                    }
                    None
                }
                ListenOutcome::Silence => None,
            },
        }
    }

    /// Dispatch one utterance. Returns `false` when the session should end.
    async fn handle(&mut self, utterance: &str) -> bool {
        match self.processor.process(utterance).await {
            DispatchOutcome::Handled(result) => {
                self.respond(&result).await;
                true
            }
            DispatchOutcome::ModeSwitch(switch) => {
                self.apply_mode_switch(switch).await;
                true
            }
            DispatchOutcome::ConfigureTiming => {
                self.configure_timing().await;
                true
            }
            DispatchOutcome::ShowVoiceSettings => {
                self.show_voice_settings();
                true
            }
            DispatchOutcome::Control(ControlCommand::Exit) => false,
            DispatchOutcome::Control(ControlCommand::Stop) => {
                if self.state.input_mode == InputMode::Voice {
                    println!("Stopping current speech...");
                    self.speech.cancel();
                    tokio::time::sleep(STOP_PAUSE).await;
                    println!("Ready for next command...");
                }
                true
            }
            DispatchOutcome::Control(ControlCommand::ClearMemory) => {
                let result = match self.store.clear() {
                    Ok(_) => DispatchResult::ok("Memory cleared successfully!"),
                    Err(e) => {
                        error!("clear memory failed: {e}");
                        DispatchResult::fail(format!("Could not clear memory: {e}"))
                    }
                };
                self.respond(&result).await;
                true
            }
            DispatchOutcome::Control(ControlCommand::MemoryStatus) => {
                let result = match self.store.status() {
                    Ok(status) => DispatchResult::ok(status),
                    Err(e) => {
                        error!("memory status failed: {e}");
                        DispatchResult::fail(format!("Could not read memory status: {e}"))
                    }
                };
                self.respond(&result).await;
                true
            }
            DispatchOutcome::Converse(utterance) => {
                self.converse(&utterance).await;
                true
            }
        }
    }

    /// Print a router result and speak it in voice mode.
    async fn respond(&mut self, result: &DispatchResult) {
        println!("{}", result.message);
        if self.state.input_mode == InputMode::Voice {
            self.speech.speak(&result.message).await;
        }
    }

    async fn apply_mode_switch(&mut self, switch: ModeSwitch) {
        match switch {
            ModeSwitch::ToText => {
                self.state.switch_to_text();
                self.voice.halt();
                println!("Switched to TEXT mode. Type your messages.");
                println!("Say 'voice mode' to switch back to voice input");
                self.speech.speak("Switched to text mode").await;
            }
            ModeSwitch::ToVoice => {
                self.state.switch_to_voice();
                // Pending typed lines are dropped on switch.
                self.text.drain();
                println!("Switched to VOICE mode. Speak your commands.");
                println!("Say 'text mode' to switch to typing");
                self.speech.speak("Switched to voice mode").await;
            }
            ModeSwitch::FastMode => {
                let message = if self.state.enable_fast_mode() {
                    "Fast mode enabled - no memory, faster responses"
                } else {
                    "Already in fast mode"
                };
                self.respond(&DispatchResult::ok(message)).await;
            }
            ModeSwitch::MemoryMode => {
                let message = if self.state.enable_memory_mode() {
                    "Memory mode enabled - slower but remembers context"
                } else {
                    "Already in memory mode"
                };
                self.respond(&DispatchResult::ok(message)).await;
            }
        }
    }

    /// Interactive voice-timing configuration. Bare Enter keeps a value;
    /// any unparsable number aborts without changing settings.
    async fn configure_timing(&mut self) {
        println!("\nCurrent voice settings:");
        println!("1. Listen timeout: how long to wait for you to start speaking");
        println!("2. Phrase limit: how long you can speak continuously");
        println!("3. Pause threshold: silence that ends a phrase");
        println!("4. Failure cooldown: wait after a recognition failure");
        println!("\nEnter new values (press Enter to keep current):");

        let timing = &self.config.voice;
        let mut updated = timing.clone();

        let prompts = [
            format!("Listen timeout (current: {}s): ", timing.listen_timeout_secs),
            format!(
                "Phrase time limit (current: {}s): ",
                timing.phrase_time_limit_secs
            ),
            format!(
                "Pause threshold (current: {}s): ",
                timing.pause_threshold_secs
            ),
            format!(
                "Failure cooldown (current: {}s): ",
                timing.failure_cooldown_secs
            ),
        ];

        for (i, prompt) in prompts.iter().enumerate() {
            print!("{prompt}");
            let _ = std::io::stdout().flush();
            let Some(line) = self.text.next_line(PROMPT_TIMEOUT).await else {
                println!("\nNo input. Settings not changed.");
                return;
            };
            if line.is_empty() {
                continue;
            }
            let applied = match i {
                0 => line.parse().map(|v| updated.listen_timeout_secs = v).is_ok(),
                1 => line
                    .parse()
                    .map(|v| updated.phrase_time_limit_secs = v)
                    .is_ok(),
                2 => line.parse().map(|v| updated.pause_threshold_secs = v).is_ok(),
                _ => line
                    .parse()
                    .map(|v| updated.failure_cooldown_secs = v)
                    .is_ok(),
            };
            if !applied {
                println!("Invalid input. Settings not changed.");
                return;
            }
        }

        self.config.voice = updated;
        println!("Voice settings updated!");
    }

    fn show_voice_settings(&self) {
        let timing = &self.config.voice;
        println!("\nCurrent voice settings:");
        println!("   Listen timeout: {} seconds", timing.listen_timeout_secs);
        println!(
            "   Phrase time limit: {} seconds",
            timing.phrase_time_limit_secs
        );
        println!("   Pause threshold: {} seconds", timing.pause_threshold_secs);
        println!(
            "   Failure cooldown: {} seconds",
            timing.failure_cooldown_secs
        );
        println!("\nSay 'set timeout' to change these settings");
    }

    /// Conversational path: fast mode streams in voice, batches in text;
    /// memory mode builds a context prompt and persists the exchange.
    async fn converse(&mut self, utterance: &str) {
        println!("Processing... ({})", self.state.status_line());

        match self.state.speed_mode {
            SpeedMode::Memory => {
                let window = self.config.memory.context_window;
                let prompt = match self.store.context_prompt(utterance, window) {
                    Ok(prompt) => prompt,
                    Err(e) => {
                        warn!("context prompt failed, continuing without history: {e}");
                        utterance.to_owned()
                    }
                };
                match self.llm.generate(&prompt).await {
                    Ok(response) => {
                        println!("Valet: {response}");
                        if let Err(e) = self.store.append(utterance, &response) {
                            warn!("could not persist exchange: {e}");
                        }
                        if self.state.input_mode == InputMode::Voice {
                            self.speech.speak(&response).await;
                        }
                    }
                    Err(e) => {
                        warn!("chat generation failed: {e}");
                        self.apologize().await;
                    }
                }
            }
            SpeedMode::Fast => {
                if self.state.input_mode == InputMode::Voice {
                    self.converse_streaming(utterance).await;
                } else {
                    match self.llm.generate(utterance).await {
                        Ok(response) => println!("Valet: {response}"),
                        Err(e) => {
                            warn!("chat generation failed: {e}");
                            self.apologize().await;
                        }
                    }
                }
            }
        }
    }

    /// Stream tokens to stdout and the speech channel as they arrive.
    async fn converse_streaming(&mut self, utterance: &str) {
        let (tx, mut rx) = mpsc::channel(STREAM_CHANNEL_SIZE);
        let client = self.llm.clone();
        let prompt = utterance.to_owned();
        let generation = tokio::spawn(async move { client.generate_streaming(&prompt, tx).await });

        let mut stream = self.speech.begin_stream();
        print!("Valet: ");
        let _ = std::io::stdout().flush();
        while let Some(token) = rx.recv().await {
            print!("{token}");
            let _ = std::io::stdout().flush();
            stream.push(&token).await;
        }
        println!();
        stream.finish().await;

        match generation.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!("streaming generation failed: {e}");
                self.apologize().await;
            }
            Err(e) => {
                warn!("streaming generation task panicked: {e}");
                self.apologize().await;
            }
        }
    }

    async fn apologize(&mut self) {
        self.respond(&DispatchResult::fail(LLM_UNAVAILABLE_MESSAGE)).await;
    }

    fn banner(&self) {
        println!("Valet is starting up...");
        match self.store.status() {
            Ok(status) => println!("{status}"),
            Err(e) => warn!("could not read memory status: {e}"),
        }
        println!("Current mode: {}", self.state.status_line());
        println!("Commands:");
        println!("   - 'text mode' / 'voice mode' - switch input methods");
        println!("   - 'fast mode' - faster responses, no memory");
        println!("   - 'memory mode' - contextual responses");
        println!("   - 'voice settings' / 'set timeout' - timing configuration");
        println!("   - 'clear memory' / 'memory status' - memory management");
    }

    fn greeting(&self) -> String {
        match self.state.speed_mode {
            SpeedMode::Memory => {
                "Hello! Valet is ready in memory mode. Say fast mode for quicker responses."
                    .to_owned()
            }
            SpeedMode::Fast => "Hello! Valet is ready in fast mode.".to_owned(),
        }
    }

    /// Scoped shutdown: stop speech and listening, say farewell.
    async fn shutdown(&mut self) {
        println!("Shutting down...");
        if self.state.input_mode == InputMode::Voice {
            self.speech.speak("Goodbye!").await;
        }
        self.voice.halt();
        self.speech.shutdown().await;
        info!("session ended");
    }
}
