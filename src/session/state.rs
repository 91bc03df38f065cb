//! Session state: input mode, speed mode, recognition-failure streak.

use crate::config::StartupInputMode;

/// Where the session reads its next utterance from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Microphone via the voice-input collaborator.
    Voice,
    /// Typed lines from the terminal.
    Text,
}

impl From<StartupInputMode> for InputMode {
    fn from(mode: StartupInputMode) -> Self {
        match mode {
            StartupInputMode::Voice => Self::Voice,
            StartupInputMode::Text => Self::Text,
        }
    }
}

/// Whether conversation memory is consulted for chat responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    /// No memory, faster responses.
    Fast,
    /// Context from the conversation store, slower.
    Memory,
}

/// Mutable session state, owned exclusively by the session controller.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current input source.
    pub input_mode: InputMode,
    /// Current chat speed mode.
    pub speed_mode: SpeedMode,
    /// Consecutive unintelligible voice results.
    pub consecutive_failures: u32,
}

impl SessionState {
    /// Initial state.
    pub fn new(input_mode: InputMode, speed_mode: SpeedMode) -> Self {
        Self {
            input_mode,
            speed_mode,
            consecutive_failures: 0,
        }
    }

    /// Switch to text input. Returns whether the mode changed.
    pub fn switch_to_text(&mut self) -> bool {
        let changed = self.input_mode != InputMode::Text;
        self.input_mode = InputMode::Text;
        changed
    }

    /// Switch to voice input. Returns whether the mode changed.
    pub fn switch_to_voice(&mut self) -> bool {
        let changed = self.input_mode != InputMode::Voice;
        self.input_mode = InputMode::Voice;
        changed
    }

    /// Enable fast mode. Returns `false` when already in fast mode
    /// (idempotent: the second call changes nothing).
    pub fn enable_fast_mode(&mut self) -> bool {
        let changed = self.speed_mode != SpeedMode::Fast;
        self.speed_mode = SpeedMode::Fast;
        changed
    }

    /// Enable memory mode. Returns `false` when already in memory mode.
    pub fn enable_memory_mode(&mut self) -> bool {
        let changed = self.speed_mode != SpeedMode::Memory;
        self.speed_mode = SpeedMode::Memory;
        changed
    }

    /// Record one unintelligible voice result. Returns `true` when the
    /// streak reached `max` — the caller owes exactly one cooldown wait
    /// and the counter resets to zero.
    pub fn record_failure(&mut self, max: u32) -> bool {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= max {
            self.consecutive_failures = 0;
            return true;
        }
        false
    }

    /// Reset the failure streak after a successful recognition.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Display line for the current mode combination.
    pub fn status_line(&self) -> String {
        let speed = match self.speed_mode {
            SpeedMode::Fast => "Fast",
            SpeedMode::Memory => "Memory",
        };
        let input = match self.input_mode {
            InputMode::Voice => "Voice",
            InputMode::Text => "Text",
        };
        format!("{speed} + {input}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn fresh() -> SessionState {
        SessionState::new(InputMode::Voice, SpeedMode::Memory)
    }

    #[test]
    fn fast_mode_is_idempotent() {
        let mut state = fresh();
        assert!(state.enable_fast_mode());
        assert_eq!(state.speed_mode, SpeedMode::Fast);

        // Second call is a no-op that reports "already".
        assert!(!state.enable_fast_mode());
        assert_eq!(state.speed_mode, SpeedMode::Fast);
    }

    #[test]
    fn memory_mode_is_idempotent() {
        let mut state = fresh();
        assert!(!state.enable_memory_mode());
        assert_eq!(state.speed_mode, SpeedMode::Memory);
    }

    #[test]
    fn input_mode_round_trip_preserves_failures() {
        let mut state = fresh();
        state.record_failure(3);
        assert_eq!(state.consecutive_failures, 1);

        state.switch_to_text();
        state.switch_to_voice();
        assert_eq!(state.input_mode, InputMode::Voice);
        assert_eq!(state.consecutive_failures, 1);
    }

    #[test]
    fn failure_streak_boundary() {
        let mut state = fresh();
        assert!(!state.record_failure(3));
        assert!(!state.record_failure(3));
        // Third consecutive failure triggers exactly one cooldown and resets.
        assert!(state.record_failure(3));
        assert_eq!(state.consecutive_failures, 0);

        // A fourth failure starts a new streak of length 1.
        assert!(!state.record_failure(3));
        assert_eq!(state.consecutive_failures, 1);
    }

    #[test]
    fn success_resets_streak() {
        let mut state = fresh();
        state.record_failure(3);
        state.record_failure(3);
        state.record_success();
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn status_line_reflects_modes() {
        let mut state = fresh();
        assert_eq!(state.status_line(), "Memory + Voice");
        state.enable_fast_mode();
        state.switch_to_text();
        assert_eq!(state.status_line(), "Fast + Text");
    }
}
