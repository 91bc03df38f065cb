//! Configuration types for the assistant.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Voice input timing settings.
    pub voice: VoiceConfig,
    /// Language model settings.
    pub llm: LlmConfig,
    /// Conversation memory settings.
    pub memory: MemoryConfig,
    /// Code workspace settings.
    pub workspace: WorkspaceConfig,
    /// Session startup settings.
    pub session: SessionConfig,
}

/// Voice input timing configuration.
///
/// These four knobs are adjustable at runtime via the `set timeout`
/// conversation command and shown by `voice settings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Seconds to wait for speech to start before giving up on a listen.
    pub listen_timeout_secs: u64,
    /// Maximum seconds a single phrase may run.
    pub phrase_time_limit_secs: u64,
    /// Seconds of silence that end a phrase.
    pub pause_threshold_secs: f64,
    /// Seconds to wait after a recognition failure before listening again.
    pub failure_cooldown_secs: u64,
    /// Consecutive unintelligible results that trigger one cooldown wait.
    pub max_consecutive_failures: u32,
    /// External speech-recognition command. Runs once per listen window;
    /// its stdout is the transcript (empty = silence, the literal
    /// `UNKNOWN` = unintelligible). `None` disables voice input.
    pub stt_command: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            listen_timeout_secs: 60,
            phrase_time_limit_secs: 30,
            pause_threshold_secs: 3.0,
            failure_cooldown_secs: 5,
            max_consecutive_failures: 3,
            stt_command: None,
        }
    }
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the local generation server.
    pub api_url: String,
    /// Model name to request.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub num_predict: u32,
    /// Sampling temperature (0.0 = greedy, higher = more random).
    pub temperature: f64,
    /// Top-p (nucleus) sampling threshold.
    pub top_p: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434".to_owned(),
            model: "mistral:latest".to_owned(),
            num_predict: 512,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// SQLite database path (None = `~/.valet/valet.db`).
    pub db_path: Option<PathBuf>,
    /// Number of recent exchanges included in the context prompt.
    pub context_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            context_window: 5,
        }
    }
}

/// Code workspace configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace root (None = current directory).
    pub root: Option<PathBuf>,
    /// Maximum bytes of file content forwarded to the LLM.
    pub max_file_bytes: usize,
    /// Entry-point filenames tried when no file is named in the command.
    pub entry_points: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_file_bytes: 8192,
            entry_points: vec![
                "main.py".to_owned(),
                "app.py".to_owned(),
                "index.py".to_owned(),
                "script.py".to_owned(),
                "main.rs".to_owned(),
                "index.js".to_owned(),
            ],
        }
    }
}

/// Which input source the session reads from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupInputMode {
    /// Listen on the microphone collaborator.
    #[default]
    Voice,
    /// Read typed lines from the terminal.
    Text,
}

/// Session startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Input mode at startup.
    pub input_mode: StartupInputMode,
    /// Start with conversation memory enabled (memory mode) or fast mode.
    pub memory_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_mode: StartupInputMode::Voice,
            memory_enabled: true,
        }
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AssistantError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/valet/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp/valet-config"))
            .join("valet")
            .join("config.toml")
    }

    /// Returns the conversation database path, honouring the config override.
    pub fn db_path(&self) -> PathBuf {
        if let Some(ref path) = self.memory.db_path {
            return path.clone();
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".valet")
            .join("valet.db")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AssistantConfig::default();
        assert!(config.voice.listen_timeout_secs > 0);
        assert!(config.voice.max_consecutive_failures > 0);
        assert!(!config.llm.api_url.is_empty());
        assert!(!config.llm.model.is_empty());
        assert!(config.llm.num_predict > 0);
        assert!(config.llm.temperature >= 0.0);
        assert!(config.llm.top_p >= 0.0 && config.llm.top_p <= 1.0);
        assert!(config.memory.context_window > 0);
        assert!(config.workspace.max_file_bytes > 0);
        assert!(!config.workspace.entry_points.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("valet-test-config-roundtrip");
        let path = dir.join("config.toml");

        let mut config = AssistantConfig::default();
        config.voice.listen_timeout_secs = 15;
        config.llm.temperature = 1.2;
        config.session.memory_enabled = false;

        assert!(config.save_to_file(&path).is_ok());
        assert!(path.exists());

        let loaded = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(loaded.voice.listen_timeout_secs, 15);
        assert!((loaded.llm.temperature - 1.2).abs() < f64::EPSILON);
        assert!(!loaded.session.memory_enabled);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result =
            AssistantConfig::from_file(std::path::Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("valet-test-config-invalid");
        let path = dir.join("bad.toml");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(&path, "this is not valid toml {{{").ok();

        let result = AssistantConfig::from_file(&path);
        assert!(result.is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = AssistantConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("valet"));
    }

    #[test]
    fn db_path_override_wins() {
        let mut config = AssistantConfig::default();
        config.memory.db_path = Some(PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/custom.db"));
    }
}
