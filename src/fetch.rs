//! Fetch orchestration: prompt, call, clean, parse, validate, retry.
//!
//! [`QuestionFetcher`] owns the only retry loop in the crate. Each attempt
//! is one model call bounded by a timeout; parse and validation failures are
//! treated like transport failures and advance the loop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::backend::{Backend, BackoffConfig, LlmRequest};
use crate::client::LlmConfig;
use crate::diagnostics::FetchDiagnostics;
use crate::error::{ModelError, Result, TriviaError};
use crate::output_parser::parse_candidates;
use crate::pool::QuestionPool;
use crate::prompt::question_prompt;
use crate::types::{resolve_category, QuestionRecord};
use crate::validator::{QuestionValidator, ValidatorConfig};
use crate::wire_shape::WireShape;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Tuning for [`QuestionFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Model identifier passed to the backend.
    pub model: String,

    /// Attempts per fetch cycle. Each attempt is one model call.
    pub max_retries: u32,

    /// Ask the model for `count * batch_factor` questions to leave room for
    /// validation losses and pool filtering.
    pub batch_factor: usize,

    /// Output format requested from, and expected of, the model.
    pub wire_shape: WireShape,

    /// Validation policy.
    pub validator: ValidatorConfig,

    /// Generation settings (temperature, token limit, JSON mode).
    pub llm: LlmConfig,

    /// Delay between attempts.
    pub backoff: BackoffConfig,

    /// Upper bound on a single model call.
    pub call_timeout: Duration,

    /// Lower temperature by 0.2 per failed attempt (floored at 0.0).
    pub cool_down: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_retries: 3,
            batch_factor: 2,
            wire_shape: WireShape::default(),
            validator: ValidatorConfig::default(),
            llm: LlmConfig::default(),
            backoff: BackoffConfig::default(),
            call_timeout: Duration::from_secs(60),
            cool_down: false,
        }
    }
}

impl FetchConfig {
    /// Temperature for attempt N (1-indexed).
    pub fn temperature_for_attempt(&self, attempt: u32) -> f64 {
        if !self.cool_down {
            return self.llm.temperature;
        }
        let drop = 0.2 * attempt.saturating_sub(1) as f64;
        (self.llm.temperature - drop).max(0.0)
    }
}

/// Questions returned by [`QuestionFetcher::fetch_questions`] with the run report.
#[derive(Debug, Clone)]
pub struct FetchOutput {
    pub questions: Vec<QuestionRecord>,
    pub diagnostics: FetchDiagnostics,
}

/// Produces validated question batches from a model [`Backend`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trivia_forge::backend::{BackoffConfig, MockBackend};
/// use trivia_forge::fetch::{FetchConfig, QuestionFetcher};
///
/// let reply = r#"[{"question": "2 + 2?", "options": ["3", "4", "5", "6"], "correctAnswer": "4"}]"#;
/// let fetcher = QuestionFetcher::builder(Arc::new(MockBackend::fixed(reply)))
///     .config(FetchConfig { backoff: BackoffConfig::none(), ..Default::default() })
///     .build();
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let output = rt.block_on(fetcher.fetch_questions("Math", 1)).unwrap();
/// assert_eq!(output.questions[0].correct_answer(), "4");
/// ```
pub struct QuestionFetcher {
    client: Client,
    base_url: String,
    backend: Arc<dyn Backend>,
    config: FetchConfig,
    validator: QuestionValidator,
    pool: Option<QuestionPool>,
}

impl std::fmt::Debug for QuestionFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionFetcher")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("has_pool", &self.pool.is_some())
            .finish()
    }
}

impl QuestionFetcher {
    /// Create a new builder around `backend`.
    pub fn builder(backend: Arc<dyn Backend>) -> QuestionFetcherBuilder {
        QuestionFetcherBuilder {
            client: None,
            base_url: crate::backend::gemini::DEFAULT_BASE_URL.to_string(),
            backend,
            config: FetchConfig::default(),
            pool: None,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn pool(&self) -> Option<&QuestionPool> {
        self.pool.as_ref()
    }

    /// Run up to `max_retries` attempts for a batch of `count` questions.
    ///
    /// Returns the first non-empty valid batch, which may hold fewer than
    /// `count` records. No delay follows the final attempt.
    pub async fn fetch_batch(
        &self,
        category: &str,
        count: usize,
        max_retries: u32,
    ) -> Result<Vec<QuestionRecord>> {
        let mut diagnostics = FetchDiagnostics::default();
        self.run_batch(category, count, max_retries, &mut diagnostics)
            .await
    }

    /// Serve up to `count` questions for `category`.
    ///
    /// Requests `count * batch_factor`, drops duplicates, filters questions
    /// already served (one extra fetch cycle when too few remain), samples
    /// down to `count` and marks the result served.
    #[tracing::instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn fetch_questions(&self, category: &str, count: usize) -> Result<FetchOutput> {
        let category = resolve_category(Some(category));
        let batch_size = count.saturating_mul(self.config.batch_factor.max(1));
        let max_retries = self.config.max_retries;
        let mut diagnostics = FetchDiagnostics::default();

        let batch = self
            .run_batch(category, batch_size, max_retries, &mut diagnostics)
            .await?;
        let batch = dedup(batch, &mut diagnostics);

        let Some(pool) = &self.pool else {
            let questions = sample(batch, count);
            tracing::info!(category, served = questions.len(), "questions ready");
            return Ok(FetchOutput {
                questions,
                diagnostics,
            });
        };

        let before = batch.len();
        let mut guard = pool.lock(category).await;
        let mut fresh = guard.filter_unused(batch);
        diagnostics.pool_filtered += (before - fresh.len()) as u32;

        if fresh.len() < count {
            // Release the category before calling the model again.
            drop(guard);
            diagnostics.refetched = true;
            tracing::info!(
                category,
                fresh = fresh.len(),
                wanted = count,
                "too few unused questions, fetching another batch"
            );
            match self
                .run_batch(category, batch_size, max_retries, &mut diagnostics)
                .await
            {
                Ok(more) => {
                    fresh.extend(more);
                    fresh = dedup(fresh, &mut diagnostics);
                }
                Err(e) => tracing::warn!(category, error = %e, "refetch failed"),
            }
            guard = pool.lock(category).await;
            let before = fresh.len();
            fresh = guard.filter_unused(fresh);
            diagnostics.pool_filtered += (before - fresh.len()) as u32;
        }

        if fresh.is_empty() {
            tracing::warn!(category, "every generated question was already served");
            return Err(TriviaError::NoUnusedQuestions {
                category: category.to_string(),
            });
        }

        let questions = sample(fresh, count);
        guard.mark_served(&questions);
        tracing::info!(
            category,
            served = questions.len(),
            total_served = guard.served_count(),
            "questions ready"
        );
        Ok(FetchOutput {
            questions,
            diagnostics,
        })
    }

    async fn run_batch(
        &self,
        category: &str,
        count: usize,
        max_retries: u32,
        diagnostics: &mut FetchDiagnostics,
    ) -> Result<Vec<QuestionRecord>> {
        let prompt = question_prompt(
            category,
            count,
            self.config.wire_shape,
            self.config.validator.require_explanation,
        );

        for attempt in 1..=max_retries {
            diagnostics.attempts += 1;
            let retry_after = match self.attempt(category, &prompt, attempt, diagnostics).await {
                Ok(records) => return Ok(records),
                Err(retry_after) => retry_after,
            };

            if attempt < max_retries {
                let delay = self
                    .config
                    .backoff
                    .delay_with_hint(attempt - 1, retry_after);
                tracing::debug!(category, attempt, delay_ms = delay.as_millis() as u64, "waiting before retry");
                diagnostics.backoff_total_ms += delay.as_millis() as u64;
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(category, attempts = max_retries, "exhausted retries");
        Err(TriviaError::ExhaustedRetries {
            attempts: max_retries,
        })
    }

    /// One model call through the cleaner, parser and validator.
    ///
    /// On failure returns the provider's `Retry-After` hint, if any.
    #[tracing::instrument(level = "debug", skip(self, prompt, diagnostics))]
    async fn attempt(
        &self,
        category: &str,
        prompt: &str,
        attempt: u32,
        diagnostics: &mut FetchDiagnostics,
    ) -> std::result::Result<Vec<QuestionRecord>, Option<Duration>> {
        let request = LlmRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            config: self
                .config
                .llm
                .clone()
                .with_temperature(self.config.temperature_for_attempt(attempt)),
        };

        let call = self.backend.complete(&self.client, &self.base_url, &request);
        let response = match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(self.model_failed(category, attempt, e, diagnostics)),
            Err(_) => {
                let e = ModelError::Timeout(self.config.call_timeout);
                return Err(self.model_failed(category, attempt, e, diagnostics));
            }
        };
        let meta = response.metadata.as_ref();
        let finish_reason = meta
            .and_then(|m| m.get("finish_reason"))
            .and_then(|v| v.as_str());
        tracing::debug!(
            category,
            attempt,
            status = response.status,
            finish_reason,
            usage = ?meta.and_then(|m| m.get("usage")),
            chars = response.text.len(),
            "model responded"
        );
        if finish_reason == Some("MAX_TOKENS") {
            tracing::warn!(
                category,
                attempt,
                max_tokens = request.config.max_tokens,
                "model output cut off at the token limit"
            );
        }

        let candidates = match parse_candidates(&response.text, self.config.wire_shape) {
            Ok(candidates) => candidates,
            Err(e) => {
                diagnostics.parse_failures += 1;
                tracing::warn!(category, attempt, reason = %e, "could not parse model output");
                return Err(None);
            }
        };

        match self.validator.validate(category, &candidates) {
            Ok(records) if records.is_empty() => {
                diagnostics.rejected_batches += 1;
                diagnostics.rejected_records += candidates.len() as u32;
                tracing::warn!(category, attempt, candidates = candidates.len(), "no valid questions in batch");
                Err(None)
            }
            Ok(records) => {
                diagnostics.rejected_records += (candidates.len() - records.len()) as u32;
                tracing::debug!(category, attempt, valid = records.len(), candidates = candidates.len(), "batch accepted");
                Ok(records)
            }
            Err(rejected) => {
                diagnostics.rejected_batches += 1;
                diagnostics.rejected_records += rejected.failures.len() as u32;
                tracing::warn!(category, attempt, reason = %rejected, "batch rejected");
                Err(None)
            }
        }
    }

    fn model_failed(
        &self,
        category: &str,
        attempt: u32,
        error: ModelError,
        diagnostics: &mut FetchDiagnostics,
    ) -> Option<Duration> {
        diagnostics.model_failures += 1;
        tracing::warn!(
            category,
            attempt,
            backend = self.backend.name(),
            reason = %error,
            "model call failed"
        );
        error.retry_after()
    }
}

/// Drop repeated questions, keeping the first occurrence.
fn dedup(records: Vec<QuestionRecord>, diagnostics: &mut FetchDiagnostics) -> Vec<QuestionRecord> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<QuestionRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect();
    diagnostics.duplicates_dropped += (before - kept.len()) as u32;
    kept
}

/// Pick `count` records at random; all of them if there are not more.
fn sample(mut records: Vec<QuestionRecord>, count: usize) -> Vec<QuestionRecord> {
    if records.len() > count {
        fastrand::shuffle(&mut records);
        records.truncate(count);
    }
    records
}

/// Builder for [`QuestionFetcher`].
pub struct QuestionFetcherBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Arc<dyn Backend>,
    config: FetchConfig,
    pool: Option<QuestionPool>,
}

impl QuestionFetcherBuilder {
    /// Set the HTTP client. If not set, one is built with `call_timeout`.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the provider base URL. Default: the public Gemini host.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set fetch tuning.
    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Filter against (and record into) a shared question pool.
    pub fn pool(mut self, pool: QuestionPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> QuestionFetcher {
        let timeout = self.config.call_timeout;
        let client = self.client.unwrap_or_else(|| {
            Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default()
        });
        QuestionFetcher {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            backend: self.backend,
            validator: QuestionValidator::new(self.config.validator),
            config: self.config,
            pool: self.pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockReply};
    use crate::validator::BatchPolicy;
    use async_trait::async_trait;

    fn question_json(texts: &[&str]) -> String {
        let items: Vec<String> = texts
            .iter()
            .map(|t| {
                format!(
                    r#"{{"question": "{t}", "options": ["a", "b", "c", "d"], "correctAnswer": "a"}}"#
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    fn test_config() -> FetchConfig {
        FetchConfig {
            backoff: BackoffConfig::none(),
            ..Default::default()
        }
    }

    fn fetcher(mock: Arc<MockBackend>, config: FetchConfig) -> QuestionFetcher {
        QuestionFetcher::builder(mock).config(config).build()
    }

    #[tokio::test]
    async fn always_failing_backend_makes_exactly_max_retries_calls() {
        let mock = Arc::new(MockBackend::failing("quota exceeded"));
        let f = fetcher(mock.clone(), test_config());

        let err = f.fetch_batch("History", 5, 3).await.unwrap_err();
        assert!(matches!(err, TriviaError::ExhaustedRetries { attempts: 3 }));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn unparseable_output_is_retried() {
        let mock = Arc::new(MockBackend::texts([
            "Sorry, I can't do that.".to_string(),
            question_json(&["Q1?", "Q2?"]),
        ]));
        let f = fetcher(mock.clone(), test_config());

        let output = f.fetch_questions("History", 2).await.unwrap();
        assert_eq!(output.questions.len(), 2);
        assert_eq!(mock.calls(), 2);
        assert_eq!(output.diagnostics.attempts, 2);
        assert_eq!(output.diagnostics.parse_failures, 1);
    }

    #[tokio::test]
    async fn partial_batch_is_accepted() {
        let mock = Arc::new(MockBackend::fixed(question_json(&["Q1?", "Q2?"])));
        let f = fetcher(mock.clone(), test_config());

        let output = f.fetch_questions("History", 5).await.unwrap();
        assert_eq!(output.questions.len(), 2);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn batch_is_sampled_down_to_count() {
        let mock = Arc::new(MockBackend::fixed(question_json(&[
            "Q1?", "Q2?", "Q3?", "Q4?", "Q5?", "Q6?",
        ])));
        let f = fetcher(mock.clone(), test_config());

        let output = f.fetch_questions("History", 3).await.unwrap();
        assert_eq!(output.questions.len(), 3);
        let prompt = mock.last_prompt().unwrap();
        assert!(prompt.contains("Generate 6 trivia questions"), "{prompt}");
    }

    #[tokio::test]
    async fn duplicates_within_batch_are_dropped() {
        let mock = Arc::new(MockBackend::fixed(question_json(&["Q1?", "q1?", "Q2?"])));
        let f = fetcher(mock, test_config());

        let output = f.fetch_questions("History", 3).await.unwrap();
        assert_eq!(output.questions.len(), 2);
        assert_eq!(output.diagnostics.duplicates_dropped, 1);
    }

    #[tokio::test]
    async fn strict_policy_rejection_advances_loop() {
        let bad_then_good = [
            r#"[{"question": "Q?", "options": ["a", "b", "c", "d"], "correctAnswer": "a"},
                {"question": "Bad?", "options": ["a", "b"], "correctAnswer": "a"}]"#
                .to_string(),
            question_json(&["Q1?"]),
        ];
        let mock = Arc::new(MockBackend::texts(bad_then_good));
        let mut config = test_config();
        config.validator.policy = BatchPolicy::Strict;
        let f = fetcher(mock.clone(), config);

        let output = f.fetch_questions("History", 1).await.unwrap();
        assert_eq!(output.questions[0].text(), "Q1?");
        assert_eq!(output.diagnostics.rejected_batches, 1);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn empty_lenient_batch_counts_as_failure() {
        let mock = Arc::new(MockBackend::fixed(r#"[{"question": "Bad?"}]"#));
        let f = fetcher(mock.clone(), test_config());

        let err = f.fetch_questions("History", 1).await.unwrap_err();
        assert!(matches!(err, TriviaError::ExhaustedRetries { attempts: 3 }));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn pool_refetches_once_then_reports_no_unused() {
        let mock = Arc::new(MockBackend::fixed(question_json(&["Q1?", "Q2?"])));
        let f = QuestionFetcher::builder(mock.clone())
            .config(test_config())
            .pool(QuestionPool::new())
            .build();

        let first = f.fetch_questions("History", 2).await.unwrap();
        assert_eq!(first.questions.len(), 2);
        assert_eq!(mock.calls(), 1);

        let err = f.fetch_questions("History", 2).await.unwrap_err();
        assert!(matches!(err, TriviaError::NoUnusedQuestions { .. }));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn pool_refetch_supplies_new_questions() {
        let mock = Arc::new(MockBackend::texts([
            question_json(&["Q1?"]),
            question_json(&["Q1?"]),
            question_json(&["Q2?", "Q3?"]),
        ]));
        let pool = QuestionPool::new();
        let f = QuestionFetcher::builder(mock.clone())
            .config(test_config())
            .pool(pool.clone())
            .build();

        f.fetch_questions("History", 1).await.unwrap();
        let second = f.fetch_questions("History", 2).await.unwrap();
        assert!(second.diagnostics.refetched);
        assert_eq!(second.diagnostics.pool_filtered, 1);
        let texts: Vec<&str> = second.questions.iter().map(|q| q.text()).collect();
        assert!(texts.contains(&"Q2?") && texts.contains(&"Q3?"));
        assert_eq!(pool.served_count("History").await, 3);
    }

    #[tokio::test]
    async fn pool_returns_what_is_left_when_refetch_fails() {
        let mock = Arc::new(MockBackend::new(vec![
            MockReply::Text(question_json(&["Q1?", "Q2?"])),
            MockReply::Fail("down".into()),
        ]));
        let mut config = test_config();
        config.max_retries = 1;
        let f = QuestionFetcher::builder(mock.clone())
            .config(config)
            .pool(QuestionPool::new())
            .build();

        let output = f.fetch_questions("History", 5).await.unwrap();
        assert_eq!(output.questions.len(), 2);
        assert!(output.diagnostics.refetched);
        assert_eq!(output.diagnostics.model_failures, 1);
    }

    struct SlowBackend;

    #[async_trait]
    impl Backend for SlowBackend {
        async fn complete(
            &self,
            _client: &Client,
            _base_url: &str,
            _request: &LlmRequest,
        ) -> std::result::Result<crate::backend::LlmResponse, ModelError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(ModelError::EmptyResponse)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let config = FetchConfig {
            call_timeout: Duration::from_millis(20),
            max_retries: 2,
            ..test_config()
        };
        let f = QuestionFetcher::builder(Arc::new(SlowBackend)).config(config).build();

        let started = std::time::Instant::now();
        let err = f.fetch_questions("History", 1).await.unwrap_err();
        assert!(matches!(err, TriviaError::ExhaustedRetries { attempts: 2 }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_backoff_waits_between_attempts_not_after_last() {
        let mock = Arc::new(MockBackend::failing("quota exceeded"));
        let config = FetchConfig {
            backoff: BackoffConfig::fixed(Duration::from_secs(1)),
            max_retries: 3,
            ..Default::default()
        };
        let f = fetcher(mock.clone(), config);
        let mut diagnostics = FetchDiagnostics::default();

        let started = tokio::time::Instant::now();
        let err = f
            .run_batch("History", 5, 3, &mut diagnostics)
            .await
            .unwrap_err();

        assert!(matches!(err, TriviaError::ExhaustedRetries { attempts: 3 }));
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(diagnostics.backoff_total_ms, 2000);
        assert_eq!(diagnostics.attempts, 3);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_failure_waits_once() {
        let mock = Arc::new(MockBackend::new(vec![
            MockReply::Fail("overloaded".into()),
            MockReply::Text(question_json(&["Q1?"])),
        ]));
        let config = FetchConfig {
            backoff: BackoffConfig::fixed(Duration::from_millis(750)),
            ..Default::default()
        };
        let f = fetcher(mock.clone(), config);

        let started = tokio::time::Instant::now();
        let output = f.fetch_questions("History", 1).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(750));
        assert_eq!(output.diagnostics.backoff_total_ms, 750);
        assert_eq!(mock.calls(), 2);
    }

    /// Hands control back to the runtime before answering, so concurrent
    /// requests all hold a batch before any of them reaches the pool.
    struct YieldingBackend(MockBackend);

    #[async_trait]
    impl Backend for YieldingBackend {
        async fn complete(
            &self,
            client: &Client,
            base_url: &str,
            request: &LlmRequest,
        ) -> std::result::Result<crate::backend::LlmResponse, ModelError> {
            tokio::task::yield_now().await;
            self.0.complete(client, base_url, request).await
        }

        fn name(&self) -> &'static str {
            "yielding"
        }
    }

    #[tokio::test]
    async fn concurrent_requests_never_share_questions() {
        let backend = YieldingBackend(MockBackend::fixed(question_json(&["Q1?", "Q2?"])));
        let pool = QuestionPool::new();
        let f = QuestionFetcher::builder(Arc::new(backend))
            .config(test_config())
            .pool(pool.clone())
            .build();

        let (a, b) = tokio::join!(
            f.fetch_questions("History", 2),
            f.fetch_questions("History", 2)
        );

        let mut served = Vec::new();
        let mut exhausted = 0;
        for result in [a, b] {
            match result {
                Ok(output) => served.extend(output.questions.iter().map(|q| q.text().to_string())),
                Err(TriviaError::NoUnusedQuestions { .. }) => exhausted += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        let unique: HashSet<&String> = served.iter().collect();
        assert_eq!(served.len(), 2);
        assert_eq!(unique.len(), 2);
        assert_eq!(exhausted, 1);
        assert_eq!(pool.served_count("History").await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_tasks_split_pool_without_overlap() {
        let mock = Arc::new(MockBackend::fixed(question_json(&[
            "Q1?", "Q2?", "Q3?", "Q4?", "Q5?", "Q6?",
        ])));
        let f = Arc::new(
            QuestionFetcher::builder(mock)
                .config(test_config())
                .pool(QuestionPool::new())
                .build(),
        );

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let f = Arc::clone(&f);
                tokio::spawn(async move { f.fetch_questions("Science", 1).await })
            })
            .collect();

        let mut served = Vec::new();
        for handle in handles {
            let output = handle.await.unwrap().unwrap();
            served.extend(output.questions.into_iter().map(|q| q.text().to_string()));
        }
        let unique: HashSet<&String> = served.iter().collect();
        assert_eq!(served.len(), 6);
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn cool_down_lowers_temperature_per_attempt() {
        let mut config = FetchConfig::default();
        assert_eq!(config.temperature_for_attempt(3), 0.7);

        config.cool_down = true;
        assert_eq!(config.temperature_for_attempt(1), 0.7);
        assert!((config.temperature_for_attempt(2) - 0.5).abs() < 1e-9);
        assert_eq!(config.temperature_for_attempt(9), 0.0);
    }

    #[test]
    fn blank_category_uses_default_in_prompt() {
        let mock = Arc::new(MockBackend::fixed(question_json(&["Q1?"])));
        let f = fetcher(mock.clone(), test_config());
        tokio_test::block_on(f.fetch_questions("   ", 1)).unwrap();
        assert!(mock.last_prompt().unwrap().contains("\"General Knowledge\""));
    }
}
