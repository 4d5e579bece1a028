//! Service configuration from command-line flags and environment.
//!
//! [`Args`] is parsed by clap, every flag with an environment fallback, after
//! `.env` has been loaded. [`ServiceConfig::from_args`] validates it and
//! fails with [`TriviaError::Config`] before anything binds.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::backend::gemini::DEFAULT_BASE_URL;
use crate::backend::{BackoffConfig, JitterStrategy};
use crate::client::LlmConfig;
use crate::error::{Result, TriviaError};
use crate::fetch::{FetchConfig, DEFAULT_MODEL};
use crate::validator::{AnswerMatch, BatchPolicy, ValidatorConfig};
use crate::wire_shape::WireShape;

/// Upper bound accepted for `MAX_RETRIES`.
const RETRY_LIMIT: u32 = 10;

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model identifier.
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Gemini API base URL.
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "0.0.0.0")]
    pub address: String,

    /// The port to listen on.
    #[arg(short, long, env, default_value_t = 5000)]
    pub port: u16,

    /// Model attempts per fetch cycle.
    #[arg(long, env, default_value_t = 3)]
    pub max_retries: u32,

    /// Questions requested from the model per question served.
    #[arg(long, env, default_value_t = 2)]
    pub batch_factor: usize,

    /// `strict` discards a batch on any invalid question; `lenient` keeps the rest.
    #[arg(long, env, default_value = "lenient")]
    pub batch_policy: BatchPolicy,

    /// `exact` or `containment` matching of the correct answer.
    #[arg(long, env, default_value = "containment")]
    pub answer_match: AnswerMatch,

    /// `structured`, `delimited` or `auto`.
    #[arg(long, env, default_value = "structured")]
    pub wire_shape: WireShape,

    /// Reject questions without an explanation.
    #[arg(long, env)]
    pub require_explanation: bool,

    /// Sampling temperature.
    #[arg(long, env, default_value_t = 0.7)]
    pub temperature: f64,

    /// Output token limit for each model call.
    #[arg(long, env, default_value_t = 8192)]
    pub max_tokens: u32,

    /// Lower the temperature on each retry.
    #[arg(long, env)]
    pub cool_down: bool,

    /// Timeout for a single model call, in seconds.
    #[arg(long, env, default_value_t = 60)]
    pub call_timeout_secs: u64,

    /// Pause between attempts, in milliseconds.
    #[arg(long, env, default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Growth factor for the pause after each further failure; 1 keeps it fixed.
    #[arg(long, env, default_value_t = 1.0)]
    pub retry_multiplier: f64,

    /// `none`, `full` or `equal` jitter on the pause between attempts.
    #[arg(long, env, default_value = "none")]
    pub retry_jitter: JitterStrategy,

    /// Largest `num_questions` a caller may request.
    #[arg(long, env, default_value_t = 50)]
    pub max_questions: usize,

    /// Serve questions without remembering what was already served.
    #[arg(long, env)]
    pub disable_pool: bool,
}

/// Validated settings for the service binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub base_url: String,
    pub bind: SocketAddr,
    pub fetch: FetchConfig,
    pub max_questions: usize,
    pub use_pool: bool,
}

impl ServiceConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let api_key = args
            .gemini_api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TriviaError::Config("GEMINI_API_KEY is not set".into()))?;

        let bind = format!("{}:{}", args.address, args.port)
            .parse::<SocketAddr>()
            .map_err(|e| {
                TriviaError::Config(format!(
                    "invalid bind address '{}:{}': {}",
                    args.address, args.port, e
                ))
            })?;

        if !(1..=RETRY_LIMIT).contains(&args.max_retries) {
            return Err(TriviaError::Config(format!(
                "MAX_RETRIES must be between 1 and {}, got {}",
                RETRY_LIMIT, args.max_retries
            )));
        }
        if args.batch_factor == 0 {
            return Err(TriviaError::Config("BATCH_FACTOR must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&args.temperature) {
            return Err(TriviaError::Config(format!(
                "TEMPERATURE must be between 0.0 and 2.0, got {}",
                args.temperature
            )));
        }
        if args.max_questions == 0 {
            return Err(TriviaError::Config("MAX_QUESTIONS must be at least 1".into()));
        }
        if args.max_tokens == 0 {
            return Err(TriviaError::Config("MAX_TOKENS must be at least 1".into()));
        }
        if !(args.retry_multiplier >= 1.0 && args.retry_multiplier.is_finite()) {
            return Err(TriviaError::Config(format!(
                "RETRY_MULTIPLIER must be at least 1.0, got {}",
                args.retry_multiplier
            )));
        }
        if args.call_timeout_secs == 0 {
            return Err(TriviaError::Config("CALL_TIMEOUT_SECS must be at least 1".into()));
        }

        let fetch = FetchConfig {
            model: args.gemini_model,
            max_retries: args.max_retries,
            batch_factor: args.batch_factor,
            wire_shape: args.wire_shape,
            validator: ValidatorConfig::default()
                .with_policy(args.batch_policy)
                .with_answer_match(args.answer_match)
                .with_require_explanation(args.require_explanation),
            llm: LlmConfig::default()
                .with_temperature(args.temperature)
                .with_max_tokens(args.max_tokens)
                .with_json_mode(args.wire_shape == WireShape::StructuredList),
            backoff: BackoffConfig::fixed(Duration::from_millis(args.retry_delay_ms))
                .with_multiplier(args.retry_multiplier)
                .with_jitter(args.retry_jitter),
            call_timeout: Duration::from_secs(args.call_timeout_secs),
            cool_down: args.cool_down,
        };

        Ok(Self {
            api_key,
            base_url: args.gemini_base_url,
            bind,
            fetch,
            max_questions: args.max_questions,
            use_pool: !args.disable_pool,
        })
    }
}
