//! Command processing and dispatch.
//!
//! The [`CommandProcessor`] classifies each utterance and hands it to
//! exactly one router. Every router call is a failure boundary: errors
//! become a [`DispatchResult`] with `success: false` and never reach the
//! session loop. State-changing commands (mode switches, control, timing
//! configuration) are returned to the session controller as outcomes
//! rather than executed here — the processor never mutates session
//! state.

use crate::automation::AutomationRouter;
use crate::code_assistant::CodeAssistant;
use crate::intent::{ControlCommand, Intent, IntentClassifier, ModeSwitch};
use crate::launcher::LauncherRouter;
use crate::vision::VisionRouter;

/// Result of one router execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    /// Human-readable outcome, printed and (in voice mode) spoken.
    pub message: String,
    /// Whether the command did what was asked.
    pub success: bool,
}

impl DispatchResult {
    /// A successful result.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// A failed result.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

/// What the session controller should do with an utterance.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A router handled the command; show (and maybe speak) the result.
    Handled(DispatchResult),
    /// Switch input or speed mode.
    ModeSwitch(ModeSwitch),
    /// Run the interactive timing configuration.
    ConfigureTiming,
    /// Show the current voice timing settings.
    ShowVoiceSettings,
    /// Session control (exit, stop, memory management).
    Control(ControlCommand),
    /// Nothing matched: converse with the LLM.
    Converse(String),
}

/// Fixed-precedence dispatcher over the domain routers.
pub struct CommandProcessor {
    classifier: IntentClassifier,
    code: CodeAssistant,
    launcher: LauncherRouter,
    automation: AutomationRouter,
    vision: VisionRouter,
}

impl CommandProcessor {
    /// Build a processor over the given routers.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier templates fail to compile.
    pub fn new(
        code: CodeAssistant,
        launcher: LauncherRouter,
        automation: AutomationRouter,
        vision: VisionRouter,
    ) -> crate::error::Result<Self> {
        Ok(Self {
            classifier: IntentClassifier::new()?,
            code,
            launcher,
            automation,
            vision,
        })
    }

    /// Classify and dispatch one utterance. Total: every utterance
    /// resolves to exactly one outcome.
    pub async fn process(&self, utterance: &str) -> DispatchOutcome {
        match self.classifier.classify(utterance) {
            Intent::DebugFile => DispatchOutcome::Handled(self.code.debug_file(utterance).await),
            Intent::DebugWorkspace => DispatchOutcome::Handled(self.code.debug_workspace().await),
            Intent::AnalyzeFile => {
                DispatchOutcome::Handled(self.code.analyze_file(utterance).await)
            }
            Intent::AnalyzeWorkspace => {
                DispatchOutcome::Handled(self.code.analyze_workspace().await)
            }
            Intent::ExplainCode => DispatchOutcome::Handled(self.code.explain_code().await),
            Intent::SuggestImprovements => {
                DispatchOutcome::Handled(self.code.suggest_improvements().await)
            }
            Intent::OpenInEditor => {
                DispatchOutcome::Handled(self.code.open_in_editor(utterance).await)
            }
            Intent::WorkspaceOverview => {
                DispatchOutcome::Handled(self.code.workspace_overview().await)
            }

            Intent::OpenApp { target } => {
                DispatchOutcome::Handled(self.launcher.open_app(&target).await)
            }
            Intent::OpenWebsite { target } => {
                DispatchOutcome::Handled(self.launcher.open_website(&target).await)
            }
            Intent::CloseApp { target } => {
                DispatchOutcome::Handled(self.launcher.close_app(&target).await)
            }
            Intent::CloseTab { .. } => DispatchOutcome::Handled(self.launcher.close_tab().await),
            Intent::CloseCurrent => DispatchOutcome::Handled(self.launcher.close_current().await),

            Intent::ModeSwitch(switch) => DispatchOutcome::ModeSwitch(switch),
            Intent::ConfigureTiming => DispatchOutcome::ConfigureTiming,
            Intent::ShowVoiceSettings => DispatchOutcome::ShowVoiceSettings,
            Intent::Control(command) => DispatchOutcome::Control(command),

            Intent::Click => DispatchOutcome::Handled(self.automation.click(utterance).await),
            Intent::TypeText => {
                DispatchOutcome::Handled(self.automation.type_text(utterance).await)
            }
            Intent::PressKey => {
                DispatchOutcome::Handled(self.automation.press_key(utterance).await)
            }
            Intent::MousePosition => {
                DispatchOutcome::Handled(self.automation.mouse_position().await)
            }

            Intent::TakeScreenshot => DispatchOutcome::Handled(self.vision.take_screenshot().await),
            Intent::AnalyzeScreen => DispatchOutcome::Handled(self.vision.analyze_screen().await),
            Intent::FindErrors => DispatchOutcome::Handled(self.vision.find_errors().await),
            Intent::ExtractText => DispatchOutcome::Handled(self.vision.extract_text().await),
            Intent::FindText => DispatchOutcome::Handled(self.vision.find_text(utterance).await),

            Intent::Converse => DispatchOutcome::Converse(utterance.to_owned()),
        }
    }
}
