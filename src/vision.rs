//! Screen analysis router.
//!
//! Chains the screenshot and OCR collaborators, then asks the LLM to
//! interpret whatever text came off the screen. Purely text-based: no
//! image understanding, so a mostly-graphical screen yields an honest
//! "couldn't read anything" answer.

use crate::dispatch::DispatchResult;
use crate::error::Result;
use crate::llm::LlmClient;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Display truncation for raw extracted text.
const EXTRACT_DISPLAY_LIMIT: usize = 200;

const DESCRIBE_QUESTION: &str = "Describe what's currently visible on this screen. \
     What applications are open and what is the user likely doing?";
const FIND_ERRORS_QUESTION: &str = "Look for any errors, warnings, or issues visible on this \
     screen. Are there any problems that need attention?";

/// Screenshot collaborator.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Capture the screen to an image file and return its path.
    async fn capture(&self) -> Result<PathBuf>;
}

/// OCR collaborator.
#[async_trait]
pub trait Ocr: Send + Sync {
    /// Extract text from an image file (possibly empty).
    async fn extract(&self, image: &Path) -> Result<String>;
}

/// Router for screenshot/OCR/analysis commands.
pub struct VisionRouter {
    screen: Arc<dyn ScreenCapture>,
    ocr: Arc<dyn Ocr>,
    llm: LlmClient,
}

impl VisionRouter {
    /// Create a router over the given collaborators.
    pub fn new(screen: Arc<dyn ScreenCapture>, ocr: Arc<dyn Ocr>, llm: LlmClient) -> Self {
        Self { screen, ocr, llm }
    }

    /// Capture a screenshot and report where it was saved.
    pub async fn take_screenshot(&self) -> DispatchResult {
        match self.screen.capture().await {
            Ok(path) => DispatchResult::ok(format!("Screenshot saved: {}", path.display())),
            Err(e) => DispatchResult::fail(format!("Screenshot failed: {e}")),
        }
    }

    /// Describe the screen contents.
    pub async fn analyze_screen(&self) -> DispatchResult {
        self.analyze_with_question(DESCRIBE_QUESTION, "Screen analysis")
            .await
    }

    /// Look for errors or warnings on screen.
    pub async fn find_errors(&self) -> DispatchResult {
        self.analyze_with_question(FIND_ERRORS_QUESTION, "Error check")
            .await
    }

    /// Extract and show raw OCR text.
    pub async fn extract_text(&self) -> DispatchResult {
        match self.screen_text().await {
            Ok(text) if text.is_empty() => DispatchResult::ok("No text detected on screen"),
            Ok(text) => {
                let shown: String = text.chars().take(EXTRACT_DISPLAY_LIMIT).collect();
                let suffix = if text.chars().count() > EXTRACT_DISPLAY_LIMIT {
                    "..."
                } else {
                    ""
                };
                DispatchResult::ok(format!("Screen text: {shown}{suffix}"))
            }
            Err(e) => DispatchResult::fail(format!("Error extracting text: {e}")),
        }
    }

    /// Case-insensitive membership test of `utterance`'s search term
    /// against the extracted screen text.
    pub async fn find_text(&self, utterance: &str) -> DispatchResult {
        let Some(search) = parse_search_term(utterance) else {
            return DispatchResult::fail("Please specify text to search for");
        };
        match self.screen_text().await {
            Ok(text) => {
                let found = text.to_lowercase().contains(&search.to_lowercase());
                let verdict = if found { "found" } else { "not found" };
                DispatchResult {
                    message: format!("Text '{search}' {verdict} on screen"),
                    success: found,
                }
            }
            Err(e) => DispatchResult::fail(format!("Text search failed: {e}")),
        }
    }

    async fn analyze_with_question(&self, question: &str, label: &str) -> DispatchResult {
        let text = match self.screen_text().await {
            Ok(text) => text,
            Err(e) => return DispatchResult::fail(format!("{label} failed: {e}")),
        };
        if text.is_empty() {
            return DispatchResult::ok(
                "I couldn't read any text from the screen. The screen might be mostly \
                 graphical or the OCR failed.",
            );
        }

        let prompt = analysis_prompt(&text, question);
        match self.llm.generate(&prompt).await {
            Ok(response) => DispatchResult::ok(format!("{label}: {response}")),
            Err(e) => DispatchResult::fail(format!("{label} failed: {e}")),
        }
    }

    /// Screenshot → OCR → cleaned text. The screenshot file is removed
    /// after extraction.
    async fn screen_text(&self) -> Result<String> {
        let path = self.screen.capture().await?;
        let text = self.ocr.extract(&path).await;
        if let Err(e) = std::fs::remove_file(&path) {
            debug!("could not remove screenshot {}: {e}", path.display());
        }
        Ok(text?.trim().to_owned())
    }
}

fn analysis_prompt(screen_text: &str, question: &str) -> String {
    format!(
        "I took a screenshot of my computer screen and extracted the following text using OCR:\n\n\
         TEXT FROM SCREEN:\n{screen_text}\n\n\
         USER QUESTION: {question}\n\n\
         Please analyze this screen content and provide a helpful response. Focus on:\n\
         1. What applications or content appear to be visible\n\
         2. Any errors, issues, or important information\n\
         3. Suggestions or next steps if relevant\n\n\
         Keep your response concise and practical."
    )
}

/// Words after the "text" token (else after "find"), quotes stripped.
fn parse_search_term(utterance: &str) -> Option<String> {
    let words: Vec<&str> = utterance.split_whitespace().collect();
    let anchor = words
        .iter()
        .position(|w| w.eq_ignore_ascii_case("text"))
        .or_else(|| words.iter().position(|w| w.eq_ignore_ascii_case("find")))?;
    let rest = words.get(anchor + 1..)?.join(" ");
    let rest = rest.trim_matches(['"', '\'']).trim().to_owned();
    if rest.is_empty() {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn search_term_follows_text_token() {
        assert_eq!(
            parse_search_term("find text login button").as_deref(),
            Some("login button")
        );
    }

    #[test]
    fn search_term_missing_is_none() {
        assert_eq!(parse_search_term("find text"), None);
    }

    #[test]
    fn analysis_prompt_embeds_text_and_question() {
        let prompt = analysis_prompt("Error: line 3", "any errors?");
        assert!(prompt.contains("Error: line 3"));
        assert!(prompt.contains("any errors?"));
    }
}
