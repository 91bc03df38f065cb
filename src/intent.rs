//! Heuristic intent classification for user utterances.
//!
//! Maps a raw utterance to an [`Intent`] by evaluating an ordered list of
//! rule groups with first-match-wins semantics. Matching is
//! case-insensitive substring and regex template matching, not NLP:
//! overlapping keywords resolve by rule-group precedence only, never by
//! specificity or word count.
//!
//! # Rule group precedence
//!
//! | Group | Examples |
//! |-------|----------|
//! | Code assistant | "debug main.py", "explain code", "workspace overview" |
//! | Open/close templates | "open youtube", "launch spotify", "close tab" |
//! | Session/config | "text mode", "fast mode", "set timeout" |
//! | Control | "exit", "stop", "clear memory" |
//! | Screen automation | "click at 100 200", "press key enter" |
//! | Screen analysis | "screenshot", "what's on screen", "find text login" |
//! | Fallback | everything else → converse with the LLM |

use crate::error::{AssistantError, Result};
use regex::Regex;

/// A classified user command.
///
/// Targets captured by the open/close templates travel with the intent;
/// routers that need finer parameters (coordinates, key names, file
/// names) re-parse them from the raw utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Debug a specific file named in the utterance.
    DebugFile,
    /// Debug across the workspace.
    DebugWorkspace,
    /// Analyze a specific file.
    AnalyzeFile,
    /// Analyze the workspace.
    AnalyzeWorkspace,
    /// Explain what the code does.
    ExplainCode,
    /// Suggest code improvements.
    SuggestImprovements,
    /// Open a file or folder in the editor.
    OpenInEditor,
    /// Summarize the workspace contents.
    WorkspaceOverview,

    /// Launch a desktop application.
    OpenApp {
        /// Application name as captured from the utterance.
        target: String,
    },
    /// Open a website in the default browser.
    OpenWebsite {
        /// Site name, URL, or search phrase.
        target: String,
    },
    /// Terminate an application by name.
    CloseApp {
        /// Application name as captured from the utterance.
        target: String,
    },
    /// Close the current browser tab.
    CloseTab {
        /// Original target when a website close was redirected here.
        target: String,
    },
    /// Close the focused window.
    CloseCurrent,

    /// Switch input or speed mode.
    ModeSwitch(ModeSwitch),
    /// Interactively reconfigure voice timing.
    ConfigureTiming,
    /// Show the current voice timing settings.
    ShowVoiceSettings,
    /// Session control command.
    Control(ControlCommand),

    /// Click at literal coordinates.
    Click,
    /// Type literal text.
    TypeText,
    /// Press a named key.
    PressKey,
    /// Report the mouse position.
    MousePosition,

    /// Capture a screenshot.
    TakeScreenshot,
    /// Describe the screen via OCR + LLM.
    AnalyzeScreen,
    /// Look for errors on screen.
    FindErrors,
    /// Extract raw OCR text from the screen.
    ExtractText,
    /// Check whether a string is visible on screen.
    FindText,

    /// No rule matched: forward the utterance to the conversational LLM.
    Converse,
}

/// Input/speed mode transitions recognized as commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSwitch {
    /// Switch to typed input.
    ToText,
    /// Switch to voice input.
    ToVoice,
    /// Enable fast mode (no memory).
    FastMode,
    /// Enable memory mode (contextual, slower).
    MemoryMode,
}

/// Session control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Terminate the session.
    Exit,
    /// Cancel in-flight speech (voice mode only).
    Stop,
    /// Clear the conversation memory.
    ClearMemory,
    /// Report the memory status.
    MemoryStatus,
}

// ── Keyword tables ──────────────────────────────────────────────────────

const DEBUG_KEYWORDS: &[&str] = &["debug", "fix", "error", "issue", "problem", "bug"];
const ANALYZE_KEYWORDS: &[&str] = &["analyze", "review", "check", "look at"];
const EXPLAIN_PHRASES: &[&str] = &["read my code", "what does this code do", "explain code"];
const IMPROVE_KEYWORDS: &[&str] = &["improve", "optimize", "better", "suggestions"];
const OVERVIEW_PHRASES: &[&str] = &["workspace", "project overview", "what files"];

/// File-extension hints that mark an analyze command as file-scoped.
const SOURCE_EXT_HINTS: &[&str] = &[".py", ".js", ".ts", ".rs", ".html", ".css"];

/// Target substrings that mark an open/close target as a website.
///
/// Named sites plus bare domain suffixes; a dot anywhere or an `http`
/// prefix also counts (checked separately).
pub const WEBSITE_INDICATORS: &[&str] = &[
    "youtube",
    "google",
    "facebook",
    "twitter",
    "instagram",
    "linkedin",
    "reddit",
    "github",
    "gmail",
    "netflix",
    "amazon",
    "wikipedia",
    "chatgpt",
    "claude",
    ".com",
    ".org",
    ".net",
];

/// Target substrings that mark an open/close target as a desktop app.
pub const APP_INDICATORS: &[&str] = &[
    "word",
    "excel",
    "powerpoint",
    "outlook",
    "notepad",
    "calculator",
    "paint",
    "chrome",
    "firefox",
    "vscode",
    "spotify",
    "discord",
    "teams",
    "file explorer",
];

const EXIT_WORDS: &[&str] = &["exit", "quit", "goodbye", "shut down", "shutdown"];
const STOP_WORDS: &[&str] = &["stop", "cancel", "quiet", "silence", "shut up", "enough"];

const SCREENSHOT_PHRASES: &[&str] = &["screenshot", "take picture", "take a screenshot"];
const ANALYZE_SCREEN_PHRASES: &[&str] = &[
    "analyze screen",
    "what's on screen",
    "describe screen",
    "read my screen",
    "what's on my screen",
    "can you see my screen",
    "what do you see",
];
const FIND_ERRORS_PHRASES: &[&str] = &["find errors", "check for errors", "look for errors"];
const EXTRACT_TEXT_PHRASES: &[&str] = &["read screen", "extract text", "what text is on screen"];

// ── Classifier ──────────────────────────────────────────────────────────

/// Ordered rule-group classifier.
///
/// Holds the compiled open/close regex templates; everything else is
/// plain substring matching over the lowercased utterance.
pub struct IntentClassifier {
    open_patterns: Vec<Regex>,
    close_current_pattern: Regex,
    close_patterns: Vec<Regex>,
}

impl IntentClassifier {
    /// Compile the open/close command templates.
    ///
    /// # Errors
    ///
    /// Returns a config error if a template fails to compile.
    pub fn new() -> Result<Self> {
        let open_patterns = compile_all(&[
            r"open\s+(.+)",
            r"launch\s+(.+)",
            r"start\s+(.+)",
            r"run\s+(.+)",
            r"show\s+me\s+(.+)",
        ])?;
        // Literal "close this/it" forms are checked before the generic
        // capture so they resolve to the focused window, not an app
        // called "this".
        let close_current_pattern = compile(r"close\s+(?:this|it)\b")?;
        let close_patterns = compile_all(&[
            r"close\s+(.+)",
            r"exit\s+(.+)",
            r"quit\s+(.+)",
            r"shut\s+down\s+(.+)",
        ])?;
        Ok(Self {
            open_patterns,
            close_current_pattern,
            close_patterns,
        })
    }

    /// Classify an utterance. Total: every utterance resolves to exactly
    /// one intent, with [`Intent::Converse`] as the fallback.
    pub fn classify(&self, utterance: &str) -> Intent {
        let lowered = utterance.to_lowercase();
        let lowered = lowered.trim();

        if let Some(intent) = classify_code(lowered) {
            return intent;
        }
        if let Some(intent) = self.classify_open_close(lowered) {
            return intent;
        }
        if let Some(intent) = classify_session(lowered) {
            return intent;
        }
        if let Some(intent) = classify_control(lowered) {
            return intent;
        }
        if let Some(intent) = classify_automation(lowered) {
            return intent;
        }
        if let Some(intent) = classify_vision(lowered) {
            return intent;
        }
        Intent::Converse
    }

    fn classify_open_close(&self, lowered: &str) -> Option<Intent> {
        for pattern in &self.open_patterns {
            if let Some(caps) = pattern.captures(lowered) {
                let target = caps.get(1).map(|m| m.as_str().trim())?;
                return Some(determine_open_target(target));
            }
        }

        if self.close_current_pattern.is_match(lowered) && !lowered.contains("tab") {
            return Some(Intent::CloseCurrent);
        }

        for pattern in &self.close_patterns {
            if let Some(caps) = pattern.captures(lowered) {
                // Any close form mentioning a tab closes the current tab.
                if lowered.contains("tab") {
                    return Some(Intent::CloseTab {
                        target: String::new(),
                    });
                }
                let target = caps.get(1).map(|m| m.as_str().trim().to_owned())?;
                // Website identifiers rarely correspond to OS process
                // names, so a website close becomes a tab close.
                if WEBSITE_INDICATORS.iter().any(|ind| target.contains(ind)) {
                    return Some(Intent::CloseTab { target });
                }
                return Some(Intent::CloseApp { target });
            }
        }

        // Implicit commands: a bare site or app name is an open request.
        if WEBSITE_INDICATORS.iter().any(|ind| lowered.contains(ind)) {
            return Some(Intent::OpenWebsite {
                target: lowered.to_owned(),
            });
        }
        if APP_INDICATORS.iter().any(|ind| lowered.contains(ind)) {
            return Some(Intent::OpenApp {
                target: lowered.to_owned(),
            });
        }

        None
    }
}

/// Classify a captured open-target as app vs website.
///
/// Website indicators win the tie-break; anything else launches as an
/// app, since every template verb here is an open verb.
fn determine_open_target(target: &str) -> Intent {
    if WEBSITE_INDICATORS.iter().any(|ind| target.contains(ind))
        || target.contains('.')
        || target.starts_with("http")
    {
        return Intent::OpenWebsite {
            target: target.to_owned(),
        };
    }
    Intent::OpenApp {
        target: target.to_owned(),
    }
}

fn classify_code(lowered: &str) -> Option<Intent> {
    if DEBUG_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        if lowered.contains("file") || SOURCE_EXT_HINTS.iter().any(|ext| lowered.contains(ext)) {
            return Some(Intent::DebugFile);
        }
        return Some(Intent::DebugWorkspace);
    }

    if ANALYZE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        if lowered.contains("file") || SOURCE_EXT_HINTS.iter().any(|ext| lowered.contains(ext)) {
            return Some(Intent::AnalyzeFile);
        }
        return Some(Intent::AnalyzeWorkspace);
    }

    if EXPLAIN_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Intent::ExplainCode);
    }

    if IMPROVE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return Some(Intent::SuggestImprovements);
    }

    if lowered.contains("open") && (lowered.contains("file") || lowered.contains("folder")) {
        return Some(Intent::OpenInEditor);
    }

    if OVERVIEW_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Intent::WorkspaceOverview);
    }

    None
}

fn classify_session(lowered: &str) -> Option<Intent> {
    if lowered.contains("set timeout") {
        return Some(Intent::ConfigureTiming);
    }
    if lowered.contains("voice settings") || lowered.contains("timing settings") {
        return Some(Intent::ShowVoiceSettings);
    }
    if lowered.contains("text mode") || lowered.contains("type mode") {
        return Some(Intent::ModeSwitch(ModeSwitch::ToText));
    }
    if lowered.contains("voice mode") || lowered.contains("speech mode") {
        return Some(Intent::ModeSwitch(ModeSwitch::ToVoice));
    }
    if lowered.contains("fast mode") || lowered.contains("speed mode") {
        return Some(Intent::ModeSwitch(ModeSwitch::FastMode));
    }
    if lowered.contains("memory mode") || lowered.contains("slow mode") {
        return Some(Intent::ModeSwitch(ModeSwitch::MemoryMode));
    }
    None
}

fn classify_control(lowered: &str) -> Option<Intent> {
    if EXIT_WORDS.iter().any(|w| lowered.contains(w)) {
        return Some(Intent::Control(ControlCommand::Exit));
    }
    if STOP_WORDS.iter().any(|w| lowered.contains(w)) {
        return Some(Intent::Control(ControlCommand::Stop));
    }
    if lowered.contains("clear memory") || lowered.contains("forget everything") {
        return Some(Intent::Control(ControlCommand::ClearMemory));
    }
    if lowered.contains("memory status") || lowered.contains("what do you remember") {
        return Some(Intent::Control(ControlCommand::MemoryStatus));
    }
    None
}

fn classify_automation(lowered: &str) -> Option<Intent> {
    if lowered.contains("click at") || lowered.contains("click on") {
        return Some(Intent::Click);
    }
    if lowered.contains("type") && (lowered.contains("text") || lowered.contains("message")) {
        return Some(Intent::TypeText);
    }
    if lowered.contains("press") && lowered.contains("key") {
        return Some(Intent::PressKey);
    }
    if lowered.contains("mouse position") || lowered.contains("where is mouse") {
        return Some(Intent::MousePosition);
    }
    None
}

fn classify_vision(lowered: &str) -> Option<Intent> {
    if SCREENSHOT_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Intent::TakeScreenshot);
    }
    if ANALYZE_SCREEN_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Intent::AnalyzeScreen);
    }
    if FIND_ERRORS_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Intent::FindErrors);
    }
    if EXTRACT_TEXT_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Intent::ExtractText);
    }
    if lowered.contains("find text") {
        return Some(Intent::FindText);
    }
    None
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AssistantError::Config(format!("bad command template: {e}")))
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile(p)).collect()
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new().unwrap()
    }

    // ── Open/close templates ────────────────────────────────────────────

    #[test]
    fn open_known_app_is_app_not_website() {
        let c = classifier();
        for app in ["notepad", "calculator", "spotify", "discord"] {
            let intent = c.classify(&format!("open {app}"));
            assert_eq!(
                intent,
                Intent::OpenApp {
                    target: app.to_owned()
                },
                "open {app}"
            );
        }
    }

    #[test]
    fn open_known_site_is_website() {
        let intent = classifier().classify("open youtube");
        assert_eq!(
            intent,
            Intent::OpenWebsite {
                target: "youtube".to_owned()
            }
        );
    }

    #[test]
    fn open_dotted_target_is_website() {
        let intent = classifier().classify("open rust-lang.org");
        assert_eq!(
            intent,
            Intent::OpenWebsite {
                target: "rust-lang.org".to_owned()
            }
        );
    }

    #[test]
    fn open_unknown_target_defaults_to_app() {
        let intent = classifier().classify("open zzzznotanapp");
        assert_eq!(
            intent,
            Intent::OpenApp {
                target: "zzzznotanapp".to_owned()
            }
        );
    }

    #[test]
    fn launch_and_start_verbs_capture_target() {
        let c = classifier();
        assert_eq!(
            c.classify("launch spotify"),
            Intent::OpenApp {
                target: "spotify".to_owned()
            }
        );
        assert_eq!(
            c.classify("show me netflix"),
            Intent::OpenWebsite {
                target: "netflix".to_owned()
            }
        );
    }

    #[test]
    fn close_tab_short_circuits() {
        let c = classifier();
        assert_eq!(
            c.classify("close tab"),
            Intent::CloseTab {
                target: String::new()
            }
        );
        assert_eq!(
            c.classify("close current tab"),
            Intent::CloseTab {
                target: String::new()
            }
        );
    }

    #[test]
    fn close_website_target_redirects_to_tab() {
        let intent = classifier().classify("close youtube");
        assert_eq!(
            intent,
            Intent::CloseTab {
                target: "youtube".to_owned()
            }
        );
    }

    #[test]
    fn close_app_target_terminates_process() {
        let intent = classifier().classify("close spotify");
        assert_eq!(
            intent,
            Intent::CloseApp {
                target: "spotify".to_owned()
            }
        );
    }

    #[test]
    fn close_this_is_close_current() {
        assert_eq!(classifier().classify("close this"), Intent::CloseCurrent);
        assert_eq!(classifier().classify("close it"), Intent::CloseCurrent);
    }

    #[test]
    fn quit_with_target_is_close_not_exit() {
        let intent = classifier().classify("quit spotify");
        assert_eq!(
            intent,
            Intent::CloseApp {
                target: "spotify".to_owned()
            }
        );
    }

    #[test]
    fn bare_site_name_is_implicit_open() {
        let intent = classifier().classify("youtube please");
        assert_eq!(
            intent,
            Intent::OpenWebsite {
                target: "youtube please".to_owned()
            }
        );
    }

    // ── Code assistant precedence ───────────────────────────────────────

    #[test]
    fn code_keywords_beat_mode_switch_keywords() {
        // Precedence invariant: the code group wins even when a
        // mode-switch keyword co-occurs.
        let intent = classifier().classify("analyze my fast mode settings");
        assert_eq!(intent, Intent::AnalyzeWorkspace);
    }

    #[test]
    fn debug_with_file_token() {
        assert_eq!(classifier().classify("debug this file"), Intent::DebugFile);
    }

    #[test]
    fn debug_named_source_file_is_file_scoped() {
        assert_eq!(classifier().classify("debug main.py"), Intent::DebugFile);
    }

    #[test]
    fn debug_without_file_hint_is_workspace_scoped() {
        assert_eq!(classifier().classify("fix my project"), Intent::DebugWorkspace);
    }

    #[test]
    fn analyze_with_extension_is_file_scoped() {
        assert_eq!(classifier().classify("analyze main.py"), Intent::AnalyzeFile);
    }

    #[test]
    fn explain_code_phrase() {
        assert_eq!(classifier().classify("explain code to me"), Intent::ExplainCode);
    }

    #[test]
    fn improvement_keywords() {
        assert_eq!(
            classifier().classify("any suggestions for this codebase"),
            Intent::SuggestImprovements
        );
    }

    #[test]
    fn open_file_goes_to_editor_not_launcher() {
        assert_eq!(classifier().classify("open file notes.txt"), Intent::OpenInEditor);
    }

    #[test]
    fn workspace_overview_phrase() {
        assert_eq!(
            classifier().classify("give me a project overview"),
            Intent::WorkspaceOverview
        );
    }

    #[test]
    fn error_phrases_resolve_to_code_group_by_precedence() {
        // "find errors" contains a debug keyword, so the code group wins
        // over the screen-analysis group.
        assert_eq!(classifier().classify("find errors"), Intent::DebugWorkspace);
    }

    // ── Session and control ─────────────────────────────────────────────

    #[test]
    fn mode_switches() {
        let c = classifier();
        assert_eq!(c.classify("text mode"), Intent::ModeSwitch(ModeSwitch::ToText));
        assert_eq!(c.classify("voice mode"), Intent::ModeSwitch(ModeSwitch::ToVoice));
        assert_eq!(c.classify("fast mode"), Intent::ModeSwitch(ModeSwitch::FastMode));
        assert_eq!(c.classify("memory mode"), Intent::ModeSwitch(ModeSwitch::MemoryMode));
        assert_eq!(c.classify("slow mode"), Intent::ModeSwitch(ModeSwitch::MemoryMode));
    }

    #[test]
    fn timing_commands() {
        let c = classifier();
        assert_eq!(c.classify("set timeout"), Intent::ConfigureTiming);
        assert_eq!(c.classify("voice settings"), Intent::ShowVoiceSettings);
    }

    #[test]
    fn control_commands() {
        let c = classifier();
        assert_eq!(c.classify("goodbye"), Intent::Control(ControlCommand::Exit));
        assert_eq!(c.classify("stop"), Intent::Control(ControlCommand::Stop));
        assert_eq!(
            c.classify("clear memory"),
            Intent::Control(ControlCommand::ClearMemory)
        );
        assert_eq!(
            c.classify("what do you remember"),
            Intent::Control(ControlCommand::MemoryStatus)
        );
    }

    #[test]
    fn bare_exit_is_control_not_close() {
        // "exit" alone has no capture target, so the close templates do
        // not match and the control group picks it up.
        assert_eq!(classifier().classify("exit"), Intent::Control(ControlCommand::Exit));
    }

    // ── Automation and vision ───────────────────────────────────────────

    #[test]
    fn automation_phrases() {
        let c = classifier();
        assert_eq!(c.classify("click at 100 200"), Intent::Click);
        assert_eq!(c.classify("type text hello there"), Intent::TypeText);
        assert_eq!(c.classify("press key enter"), Intent::PressKey);
        assert_eq!(c.classify("mouse position"), Intent::MousePosition);
    }

    #[test]
    fn indicator_substring_wins_over_automation_group() {
        // "world" contains the app indicator "word", and the implicit
        // open rule group runs before screen automation.
        assert_eq!(
            classifier().classify("type text hello world"),
            Intent::OpenApp {
                target: "type text hello world".to_owned()
            }
        );
    }

    #[test]
    fn vision_phrases() {
        let c = classifier();
        assert_eq!(c.classify("take a screenshot"), Intent::TakeScreenshot);
        assert_eq!(c.classify("what's on screen"), Intent::AnalyzeScreen);
        assert_eq!(c.classify("extract text"), Intent::ExtractText);
        assert_eq!(c.classify("find text login"), Intent::FindText);
    }

    // ── Fallback ────────────────────────────────────────────────────────

    #[test]
    fn unmatched_utterance_converses() {
        let intent = classifier().classify("tell me something nice");
        assert_eq!(intent, Intent::Converse);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(
            classifier().classify("OPEN YOUTUBE"),
            Intent::OpenWebsite {
                target: "youtube".to_owned()
            }
        );
    }
}
