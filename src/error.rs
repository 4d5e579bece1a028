use std::time::Duration;
use thiserror::Error;

use crate::output_parser::ParseError;

/// Errors produced by the question service and its components.
#[derive(Error, Debug)]
pub enum TriviaError {
    /// Missing credential or invalid settings. Fatal at startup.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The model client failed (transport, auth, quota, timeout).
    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),

    /// The model answered, but the text could not be turned into candidates.
    #[error("Could not parse model output: {0}")]
    Parse(#[from] ParseError),

    /// Every attempt failed to produce a non-empty valid batch.
    #[error("Failed to generate questions: exhausted retries after {attempts} attempts")]
    ExhaustedRetries {
        /// Number of attempts actually made.
        attempts: u32,
    },

    /// Valid questions were produced, but all of them were already served
    /// for this category.
    #[error("No unused questions left for category '{category}'")]
    NoUnusedQuestions { category: String },
}

/// Errors returned by a [`Backend`](crate::backend::Backend).
///
/// All variants are treated as retryable by the fetcher.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Low-level HTTP transport failure (connection refused, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status from the provider (401/403 auth, 429 quota, 5xx).
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// The call did not finish within the configured timeout.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// The provider refused the prompt (safety filter, recitation, ...).
    #[error("prompt blocked by provider: {0}")]
    Blocked(String),

    /// The provider returned a success status with no text in it.
    #[error("model returned no text")]
    EmptyResponse,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Provider-suggested delay before the next call, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ModelError::HttpError { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriviaError>;
