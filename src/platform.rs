//! Default collaborator implementations backed by host tools.
//!
//! Everything here shells out to programs resolved on PATH at
//! construction time (`xdotool`, `tesseract`, `say`/`espeak`, the
//! platform screenshot tool). Each implementation sits behind its
//! collaborator trait, so a missing tool degrades that one capability
//! with a clear message instead of taking the session down.

use crate::automation::InputSynth;
use crate::config::VoiceConfig;
use crate::error::{AssistantError, Result};
use crate::launcher::ProcessHost;
use crate::listen::{ListenOutcome, VoiceInput};
use crate::speech::Synthesizer;
use crate::vision::{Ocr, ScreenCapture};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

// ── Process host ────────────────────────────────────────────────────────

/// Process collaborator over `std::process`/`tokio::process`.
pub struct CommandProcessHost;

#[async_trait]
impl ProcessHost for CommandProcessHost {
    async fn spawn(&self, program: &Path, args: &[String]) -> Result<u32> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| AssistantError::Launch(format!("{}: {e}", program.display())))?;
        child
            .id()
            .ok_or_else(|| AssistantError::Launch(format!("{} exited at once", program.display())))
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    async fn terminate_matching(&self, name: &str) -> Result<bool> {
        let status = if cfg!(windows) {
            tokio::process::Command::new("taskkill")
                .args(["/F", "/IM", &format!("{name}*")])
                .status()
                .await
        } else {
            tokio::process::Command::new("pkill")
                .args(["-i", "-f", name])
                .status()
                .await
        }
        .map_err(|e| AssistantError::Launch(format!("terminate {name}: {e}")))?;
        Ok(status.success())
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        let status = if cfg!(target_os = "macos") {
            tokio::process::Command::new("open").arg(url).status().await
        } else if cfg!(windows) {
            tokio::process::Command::new("cmd")
                .args(["/C", "start", url])
                .status()
                .await
        } else {
            tokio::process::Command::new("xdg-open")
                .arg(url)
                .status()
                .await
        }
        .map_err(|e| AssistantError::Launch(format!("open {url}: {e}")))?;
        if !status.success() {
            return Err(AssistantError::Launch(format!(
                "browser open exited with {status}"
            )));
        }
        Ok(())
    }
}

// ── Input synthesis ─────────────────────────────────────────────────────

/// Mouse/keyboard synthesis via `xdotool`.
pub struct DesktopInput {
    tool: PathBuf,
}

impl DesktopInput {
    /// Resolve `xdotool` on PATH.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is not installed.
    pub fn new() -> Result<Self> {
        let tool = which::which("xdotool")
            .map_err(|_| AssistantError::Input("xdotool not found on PATH".to_owned()))?;
        Ok(Self { tool })
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = tokio::process::Command::new(&self.tool)
            .args(args)
            .output()
            .await
            .map_err(|e| AssistantError::Input(format!("xdotool: {e}")))?;
        if !output.status.success() {
            return Err(AssistantError::Input(format!(
                "xdotool {} exited with {}",
                args.first().unwrap_or(&""),
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl InputSynth for DesktopInput {
    async fn click(&self, x: i32, y: i32) -> Result<()> {
        self.run(&["mousemove", &x.to_string(), &y.to_string()]).await?;
        self.run(&["click", "1"]).await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.run(&["type", "--delay", "50", text]).await?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.run(&["key", key]).await?;
        Ok(())
    }

    async fn key_combo(&self, keys: &[&str]) -> Result<()> {
        self.run(&["key", &keys.join("+")]).await?;
        Ok(())
    }

    async fn mouse_position(&self) -> Result<(i32, i32)> {
        let output = self.run(&["getmouselocation"]).await?;
        parse_mouse_location(&output)
            .ok_or_else(|| AssistantError::Input(format!("unexpected xdotool output: {output}")))
    }
}

/// Parse `x:512 y:384 screen:0 window:...` into coordinates.
fn parse_mouse_location(output: &str) -> Option<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for field in output.split_whitespace() {
        if let Some(value) = field.strip_prefix("x:") {
            x = value.parse().ok();
        } else if let Some(value) = field.strip_prefix("y:") {
            y = value.parse().ok();
        }
    }
    Some((x?, y?))
}

// ── Screen capture ──────────────────────────────────────────────────────

/// Screenshot via the first capture tool found on PATH.
pub struct ShellScreenCapture {
    tool: PathBuf,
    tool_name: String,
}

impl ShellScreenCapture {
    /// Resolve a screenshot tool.
    ///
    /// # Errors
    ///
    /// Returns an error if none of the known tools is installed.
    pub fn new() -> Result<Self> {
        for name in ["screencapture", "gnome-screenshot", "scrot", "import"] {
            if let Ok(tool) = which::which(name) {
                return Ok(Self {
                    tool,
                    tool_name: name.to_owned(),
                });
            }
        }
        Err(AssistantError::Screenshot(
            "no screenshot tool found (tried screencapture, gnome-screenshot, scrot, import)"
                .to_owned(),
        ))
    }
}

#[async_trait]
impl ScreenCapture for ShellScreenCapture {
    async fn capture(&self) -> Result<PathBuf> {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let path = std::env::temp_dir().join(format!("valet_screenshot_{stamp}.png"));
        let path_str = path.to_string_lossy().into_owned();

        let args: Vec<String> = match self.tool_name.as_str() {
            "screencapture" => vec!["-x".to_owned(), path_str],
            "gnome-screenshot" => vec!["-f".to_owned(), path_str],
            "import" => vec!["-window".to_owned(), "root".to_owned(), path_str],
            _ => vec![path_str],
        };

        let status = tokio::process::Command::new(&self.tool)
            .args(&args)
            .status()
            .await
            .map_err(|e| AssistantError::Screenshot(format!("{}: {e}", self.tool_name)))?;
        if !status.success() || !path.exists() {
            return Err(AssistantError::Screenshot(format!(
                "{} did not produce an image",
                self.tool_name
            )));
        }
        Ok(path)
    }
}

// ── OCR ─────────────────────────────────────────────────────────────────

/// OCR via the `tesseract` binary.
pub struct TesseractOcr {
    binary: PathBuf,
}

impl TesseractOcr {
    /// Resolve `tesseract` on PATH.
    ///
    /// # Errors
    ///
    /// Returns an error if tesseract is not installed.
    pub fn new() -> Result<Self> {
        let binary = which::which("tesseract").map_err(|_| {
            AssistantError::Ocr(
                "tesseract not found. Install it: https://github.com/tesseract-ocr/tesseract"
                    .to_owned(),
            )
        })?;
        Ok(Self { binary })
    }
}

#[async_trait]
impl Ocr for TesseractOcr {
    async fn extract(&self, image: &Path) -> Result<String> {
        let output = tokio::process::Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .output()
            .await
            .map_err(|e| AssistantError::Ocr(format!("tesseract: {e}")))?;
        if !output.status.success() {
            return Err(AssistantError::Ocr(format!(
                "tesseract exited with {}",
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Speech synthesis ────────────────────────────────────────────────────

/// TTS via the first of `say`, `espeak`, `spd-say` found on PATH.
pub struct ShellSynthesizer {
    program: PathBuf,
}

impl ShellSynthesizer {
    /// Resolve a TTS program.
    ///
    /// # Errors
    ///
    /// Returns an error if no TTS program is installed.
    pub fn new() -> Result<Self> {
        for name in ["say", "espeak", "spd-say"] {
            if let Ok(program) = which::which(name) {
                return Ok(Self { program });
            }
        }
        Err(AssistantError::Speech(
            "no TTS program found (tried say, espeak, spd-say)".to_owned(),
        ))
    }
}

impl Synthesizer for ShellSynthesizer {
    fn synthesize(&self, text: &str) -> Result<()> {
        let status = std::process::Command::new(&self.program)
            .arg(text)
            .status()
            .map_err(|e| AssistantError::Speech(format!("{}: {e}", self.program.display())))?;
        if !status.success() {
            return Err(AssistantError::Speech(format!(
                "TTS exited with {status}"
            )));
        }
        Ok(())
    }
}

/// Fallback synthesizer when no TTS program is available.
pub struct NullSynthesizer;

impl Synthesizer for NullSynthesizer {
    fn synthesize(&self, text: &str) -> Result<()> {
        println!("TTS not available, would say: {text}");
        Ok(())
    }
}

// ── Voice input ─────────────────────────────────────────────────────────

/// Voice input via a configured external recognition command.
///
/// The command runs once per listen window; stdout is the transcript.
/// Empty output (or a timeout) is silence; the literal `UNKNOWN` marks
/// unintelligible audio.
pub struct CommandVoiceInput {
    command: String,
}

impl CommandVoiceInput {
    /// Wrap the configured recognition command.
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

#[async_trait]
impl VoiceInput for CommandVoiceInput {
    async fn listen(&mut self, timing: &VoiceConfig) -> ListenOutcome {
        let window = Duration::from_secs(timing.listen_timeout_secs);
        let run = tokio::process::Command::new("sh")
            .args(["-c", &self.command])
            .output();
        let output = match tokio::time::timeout(window, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("speech recognition command failed: {e}");
                return ListenOutcome::Silence;
            }
            Err(_) => {
                debug!("no speech within {} seconds", timing.listen_timeout_secs);
                return ListenOutcome::Silence;
            }
        };

        let transcript = String::from_utf8_lossy(&output.stdout);
        let transcript = transcript.trim();
        if !output.status.success() || transcript.is_empty() {
            return ListenOutcome::Silence;
        }
        if transcript == "UNKNOWN" {
            return ListenOutcome::Unintelligible;
        }
        ListenOutcome::Heard(transcript.to_owned())
    }
}

/// Voice input stub used when no recognition backend is configured.
///
/// Sleeps through the listen window and reports silence, so a session
/// accidentally left in voice mode stays calm instead of spinning.
pub struct NullVoiceInput;

#[async_trait]
impl VoiceInput for NullVoiceInput {
    async fn listen(&mut self, timing: &VoiceConfig) -> ListenOutcome {
        tokio::time::sleep(Duration::from_secs(timing.listen_timeout_secs)).await;
        ListenOutcome::Silence
    }
}

// ── Unavailable stubs ───────────────────────────────────────────────────

/// Stand-in for input/vision collaborators whose host tool is missing.
/// Every call fails with an instructive message.
pub struct Unavailable {
    what: &'static str,
    hint: &'static str,
}

impl Unavailable {
    /// Input synthesis stub.
    pub fn input() -> Self {
        Self {
            what: "input synthesis",
            hint: "install xdotool",
        }
    }

    /// Screen capture stub.
    pub fn capture() -> Self {
        Self {
            what: "screen capture",
            hint: "install gnome-screenshot or scrot",
        }
    }

    /// OCR stub.
    pub fn ocr() -> Self {
        Self {
            what: "OCR",
            hint: "install tesseract",
        }
    }

    fn err(&self) -> AssistantError {
        AssistantError::Input(format!("{} not available ({})", self.what, self.hint))
    }
}

#[async_trait]
impl InputSynth for Unavailable {
    async fn click(&self, _x: i32, _y: i32) -> Result<()> {
        Err(self.err())
    }
    async fn type_text(&self, _text: &str) -> Result<()> {
        Err(self.err())
    }
    async fn press_key(&self, _key: &str) -> Result<()> {
        Err(self.err())
    }
    async fn key_combo(&self, _keys: &[&str]) -> Result<()> {
        Err(self.err())
    }
    async fn mouse_position(&self) -> Result<(i32, i32)> {
        Err(self.err())
    }
}

#[async_trait]
impl ScreenCapture for Unavailable {
    async fn capture(&self) -> Result<PathBuf> {
        Err(self.err())
    }
}

#[async_trait]
impl Ocr for Unavailable {
    async fn extract(&self, _image: &Path) -> Result<String> {
        Err(self.err())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn mouse_location_parsing() {
        assert_eq!(
            parse_mouse_location("x:512 y:384 screen:0 window:71303170"),
            Some((512, 384))
        );
        assert_eq!(parse_mouse_location("garbage"), None);
    }
}
