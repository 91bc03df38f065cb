//! Voice input collaborator surface.

use crate::config::VoiceConfig;
use async_trait::async_trait;

/// Result of one listen window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// Speech was recognized.
    Heard(String),
    /// Audio was captured but could not be understood. Counts toward the
    /// consecutive-failure streak.
    Unintelligible,
    /// No speech within the listen window. Does not count as a failure.
    Silence,
}

/// Voice recognition collaborator.
///
/// Implementations block (asynchronously) for up to the configured
/// listen window. Timing is passed per call because the `set timeout`
/// command adjusts it at runtime.
#[async_trait]
pub trait VoiceInput: Send + Sync {
    /// Wait for the next utterance.
    async fn listen(&mut self, timing: &VoiceConfig) -> ListenOutcome;

    /// Stop any in-progress listen (called on mode switch and shutdown).
    fn halt(&mut self) {}
}
