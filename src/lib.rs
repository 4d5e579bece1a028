//! # Trivia Forge
//!
//! A question service that prompts Gemini for multiple-choice trivia and
//! turns its free-form output into strictly valid question records.
//!
//! The model is untrusted: its text may carry markdown fences, prose, comments,
//! trailing commas, stray fragments or a different format altogether. Every
//! response passes through the same pipeline before anything reaches a caller.
//!
//! ## Core Concepts
//!
//! - **[`output_parser`]**: cleaner and parsers from raw text to candidate
//!   mappings, for a JSON list or pipe-delimited lines ([`WireShape`]).
//! - **[`QuestionValidator`]**: schema checks, answer canonicalization and
//!   the strict/lenient [`BatchPolicy`].
//! - **[`QuestionFetcher`]**: the bounded retry loop around a [`Backend`],
//!   plus in-batch de-duplication and sampling.
//! - **[`QuestionPool`]**: per-category memory of served questions.
//! - **[`server`]**: the axum router (`/api/questions`, `/api/clear_cache`).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use trivia_forge::{GeminiBackend, QuestionFetcher, QuestionPool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = QuestionFetcher::builder(Arc::new(GeminiBackend::new("api-key")))
//!         .pool(QuestionPool::new())
//!         .build();
//!
//!     let output = fetcher.fetch_questions("Science", 5).await?;
//!     for q in &output.questions {
//!         println!("{} -> {}", q.text(), q.correct_answer());
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod escape;
pub mod fetch;
pub mod output_parser;
pub mod pool;
pub mod prompt;
pub mod server;
pub mod types;
pub mod validator;
pub mod wire_shape;

pub use backend::{Backend, BackoffConfig, GeminiBackend, MockBackend};
pub use client::LlmConfig;
pub use diagnostics::FetchDiagnostics;
pub use error::{ModelError, Result, TriviaError};
pub use fetch::{FetchConfig, FetchOutput, QuestionFetcher};
pub use output_parser::ParseError;
pub use pool::QuestionPool;
pub use types::QuestionRecord;
pub use validator::{AnswerMatch, BatchPolicy, QuestionValidator, ValidatorConfig};
pub use wire_shape::WireShape;
