//! Error types for the model-output cleaning and parsing stages.

/// Errors returned by the cleaner and the parsers.
///
/// Every variant is retryable by re-fetching, never by re-parsing the same text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The model response was empty or whitespace-only.
    #[error("empty model response")]
    EmptyResponse,

    /// No `[` ... `]` region could be located in the response.
    #[error("no list boundary found in model response: {text}")]
    MissingListBoundary {
        /// A truncated copy of the cleaned text (max 200 chars).
        text: String,
    },

    /// The cleaned payload failed to decode as JSON.
    #[error("malformed question list: {reason}")]
    Malformed {
        /// The serde error message.
        reason: String,
        /// A truncated copy of the payload that failed decoding.
        raw_json: String,
    },

    /// The payload decoded, but the top level was not a list.
    #[error("expected a list of questions, got {found}")]
    NotAList {
        /// JSON type name of what was decoded instead.
        found: &'static str,
    },
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len).collect();
        format!("{}...", head)
    }
}
