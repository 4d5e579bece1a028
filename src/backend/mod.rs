//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over model providers, translating between
//! normalized [`LlmRequest`]/[`LlmResponse`] types and provider-specific
//! HTTP APIs. Built-in implementations: [`GeminiBackend`], [`MockBackend`].
//!
//! ## Architecture
//!
//! ```text
//! QuestionFetcher ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                           │
//!                                ┌──────────┴──────────┐
//!                          GeminiBackend           MockBackend
//!                   :generateContent (v1beta)     canned replies
//! ```
//!
//! Backends make exactly one call per `complete`. Retry, timeout and backoff
//! belong to the [`QuestionFetcher`](crate::fetch::QuestionFetcher).

pub mod backoff;
pub mod gemini;
pub mod mock;

pub use backoff::{BackoffConfig, JitterStrategy};
pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockReply};

use crate::client::LlmConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;

/// A normalized model request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"gemini-2.5-flash"`).
    pub model: String,

    /// The prompt text.
    pub prompt: String,

    /// Generation configuration (temperature, max_tokens, json_mode).
    pub config: LlmConfig,
}

/// A normalized model response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, finish reason, model version).
    /// Stored as raw JSON; each provider returns different fields.
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over model providers.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a single, non-streaming generation call.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, ModelError>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
