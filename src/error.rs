//! Error types for the assistant.

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Speech synthesis error.
    #[error("speech error: {0}")]
    Speech(String),

    /// Language model request error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Screenshot capture error.
    #[error("screenshot error: {0}")]
    Screenshot(String),

    /// OCR text extraction error.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Mouse/keyboard synthesis error.
    #[error("input synthesis error: {0}")]
    Input(String),

    /// Application launch or close error.
    #[error("launch error: {0}")]
    Launch(String),

    /// Conversation store error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
