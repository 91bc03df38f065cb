//! Screen automation router.
//!
//! Parses literal coordinates, text, and key names out of the utterance
//! and forwards them to the input-synthesis collaborator. Malformed or
//! missing parameters produce specific "please specify" messages rather
//! than generic failures.

use crate::dispatch::DispatchResult;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Mouse/keyboard synthesis collaborator.
#[async_trait]
pub trait InputSynth: Send + Sync {
    /// Click the left button at screen coordinates.
    async fn click(&self, x: i32, y: i32) -> Result<()>;
    /// Type literal text into the focused window.
    async fn type_text(&self, text: &str) -> Result<()>;
    /// Press a single named key.
    async fn press_key(&self, key: &str) -> Result<()>;
    /// Press a key combination (e.g. `["ctrl", "w"]`).
    async fn key_combo(&self, keys: &[&str]) -> Result<()>;
    /// Current mouse position.
    async fn mouse_position(&self) -> Result<(i32, i32)>;
}

/// Router for raw click/type/press commands.
pub struct AutomationRouter {
    input: Arc<dyn InputSynth>,
}

impl AutomationRouter {
    /// Create a router over the given input collaborator.
    pub fn new(input: Arc<dyn InputSynth>) -> Self {
        Self { input }
    }

    /// Execute a click command.
    pub async fn click(&self, utterance: &str) -> DispatchResult {
        let Some((x, y)) = parse_coordinates(utterance) else {
            return DispatchResult::fail("Please specify coordinates like 'click at 100 200'");
        };
        match self.input.click(x, y).await {
            Ok(()) => DispatchResult::ok(format!("Clicked at ({x}, {y})")),
            Err(e) => DispatchResult::fail(format!("Click failed: {e}")),
        }
    }

    /// Execute a type-text command.
    pub async fn type_text(&self, utterance: &str) -> DispatchResult {
        let Some(text) = parse_type_text(utterance) else {
            return DispatchResult::fail("Please specify text to type");
        };
        match self.input.type_text(&text).await {
            Ok(()) => DispatchResult::ok(format!("Typed: {text}")),
            Err(e) => DispatchResult::fail(format!("Typing failed: {e}")),
        }
    }

    /// Execute a press-key command.
    pub async fn press_key(&self, utterance: &str) -> DispatchResult {
        let Some(key) = parse_key(utterance) else {
            return DispatchResult::fail("Please specify which key to press");
        };
        match self.input.press_key(&key).await {
            Ok(()) => DispatchResult::ok(format!("Pressed key: {key}")),
            Err(e) => DispatchResult::fail(format!("Key press failed: {e}")),
        }
    }

    /// Report the mouse position.
    pub async fn mouse_position(&self) -> DispatchResult {
        match self.input.mouse_position().await {
            Ok((x, y)) => DispatchResult::ok(format!("Mouse is at position ({x}, {y})")),
            Err(e) => DispatchResult::fail(format!("Could not read mouse position: {e}")),
        }
    }
}

/// First two integer tokens in the utterance.
fn parse_coordinates(utterance: &str) -> Option<(i32, i32)> {
    let mut numbers = utterance
        .split_whitespace()
        .filter_map(|word| word.parse::<i32>().ok());
    let x = numbers.next()?;
    let y = numbers.next()?;
    Some((x, y))
}

/// Everything after the first "type" keyword, quotes stripped.
fn parse_type_text(utterance: &str) -> Option<String> {
    let lowered = utterance.to_lowercase();
    let start = lowered.find("type")? + "type".len();
    let text = utterance[start..].trim().trim_matches(['"', '\'']).trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_owned())
}

/// The token following the word "key".
fn parse_key(utterance: &str) -> Option<String> {
    let words: Vec<&str> = utterance.split_whitespace().collect();
    let key_index = words.iter().position(|w| w.eq_ignore_ascii_case("key"))?;
    words.get(key_index + 1).map(|w| w.to_lowercase())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingInput {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InputSynth for RecordingInput {
        async fn click(&self, x: i32, y: i32) -> Result<()> {
            self.calls.lock().unwrap().push(format!("click {x} {y}"));
            Ok(())
        }
        async fn type_text(&self, text: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("type {text}"));
            Ok(())
        }
        async fn press_key(&self, key: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("press {key}"));
            Ok(())
        }
        async fn key_combo(&self, keys: &[&str]) -> Result<()> {
            self.calls.lock().unwrap().push(format!("combo {}", keys.join("+")));
            Ok(())
        }
        async fn mouse_position(&self) -> Result<(i32, i32)> {
            Ok((640, 480))
        }
    }

    #[test]
    fn coordinates_take_first_two_integers() {
        assert_eq!(parse_coordinates("click at 100 200"), Some((100, 200)));
        assert_eq!(parse_coordinates("click at 100"), None);
        assert_eq!(parse_coordinates("click somewhere nice"), None);
    }

    #[test]
    fn type_text_takes_everything_after_the_verb() {
        assert_eq!(
            parse_type_text("type 'hello world'").as_deref(),
            Some("hello world")
        );
        // The "text"/"message" marker word is part of the typed payload.
        assert_eq!(
            parse_type_text("type text hello").as_deref(),
            Some("text hello")
        );
        assert_eq!(parse_type_text("type   "), None);
    }

    #[test]
    fn key_is_token_after_key_word() {
        assert_eq!(parse_key("press key enter").as_deref(), Some("enter"));
        assert_eq!(parse_key("press key"), None);
    }

    #[tokio::test]
    async fn click_with_coordinates_succeeds() {
        let input = Arc::new(RecordingInput::default());
        let router = AutomationRouter::new(input.clone());

        let result = router.click("click at 100 200").await;
        assert!(result.success);
        assert_eq!(result.message, "Clicked at (100, 200)");
        assert_eq!(input.calls.lock().unwrap().as_slice(), ["click 100 200"]);
    }

    #[tokio::test]
    async fn click_without_coordinates_asks_for_them() {
        let router = AutomationRouter::new(Arc::new(RecordingInput::default()));
        let result = router.click("click on the button").await;
        assert!(!result.success);
        assert!(result.message.contains("specify coordinates"));
    }

    #[tokio::test]
    async fn mouse_position_reports_coordinates() {
        let router = AutomationRouter::new(Arc::new(RecordingInput::default()));
        let result = router.mouse_position().await;
        assert!(result.success);
        assert_eq!(result.message, "Mouse is at position (640, 480)");
    }
}
