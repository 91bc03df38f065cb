//! Language model access.
//!
//! Talks to a local Ollama-compatible generation server over HTTP.
//! Batch and streaming generation share one request shape; streaming
//! yields newline-delimited JSON objects with a `response` token field.

mod client;

pub use client::LlmClient;

/// Fixed apology surfaced when the generation backend is unreachable.
///
/// Routers and the chat path never propagate LLM transport errors to the
/// session loop; they speak/print this instead.
pub const LLM_UNAVAILABLE_MESSAGE: &str =
    "I'm sorry, I'm having trouble processing that request right now.";

/// Find the position of a sentence-ending character (`.`, `!`, `?`, `\n`).
///
/// Returns the byte index of the boundary character, or `None` if no
/// boundary is found. Used to cut streamed tokens into sentences for the
/// speech channel.
pub(crate) fn find_sentence_boundary(text: &str) -> Option<usize> {
    // Look for sentence-ending punctuation followed by a space or end of text
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?' | '\n') {
            // Not a boundary when mid-token (e.g. a decimal point or filename)
            let rest = &text[i + c.len_utf8()..];
            if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\n') {
                return Some(i);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn sentence_boundary_at_period() {
        assert_eq!(find_sentence_boundary("Hello there. More"), Some(11));
    }

    #[test]
    fn sentence_boundary_at_end_of_text() {
        assert_eq!(find_sentence_boundary("Done!"), Some(4));
    }

    #[test]
    fn decimal_point_is_not_a_boundary() {
        assert_eq!(find_sentence_boundary("pi is 3.14159"), None);
    }

    #[test]
    fn filename_dot_is_not_a_boundary() {
        assert_eq!(find_sentence_boundary("open main.py now"), None);
    }

    #[test]
    fn no_boundary_in_plain_text() {
        assert_eq!(find_sentence_boundary("still streaming"), None);
    }
}
