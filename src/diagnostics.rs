//! Run report for a question fetch.
//!
//! [`FetchDiagnostics`] records what happened while serving one request: how
//! many model attempts were made, how each failed attempt failed, how many
//! records validation and the pool dropped, and how long was spent waiting.

/// Records what happened during [`QuestionFetcher::fetch_questions`].
///
/// # Example
///
/// ```
/// use trivia_forge::diagnostics::FetchDiagnostics;
///
/// let diag = FetchDiagnostics::default();
/// assert_eq!(diag.failed_attempts(), 0);
/// assert!(!diag.refetched);
/// ```
///
/// [`QuestionFetcher::fetch_questions`]: crate::fetch::QuestionFetcher::fetch_questions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchDiagnostics {
    /// Model calls made, across all fetch cycles.
    pub attempts: u32,

    /// Attempts that failed at the model boundary (transport, quota, timeout).
    pub model_failures: u32,

    /// Attempts whose text could not be cleaned or parsed.
    pub parse_failures: u32,

    /// Attempts whose batch was rejected outright or validated to nothing.
    pub rejected_batches: u32,

    /// Candidates dropped by validation in accepted batches.
    pub rejected_records: u32,

    /// Duplicate questions dropped within a batch.
    pub duplicates_dropped: u32,

    /// Valid questions withheld because they were already served.
    pub pool_filtered: u32,

    /// Whether a second fetch cycle ran because the pool left too few.
    pub refetched: bool,

    /// Total time spent in backoff delays (milliseconds).
    pub backoff_total_ms: u64,
}

impl FetchDiagnostics {
    /// Attempts that did not yield a usable batch.
    pub fn failed_attempts(&self) -> u32 {
        self.model_failures + self.parse_failures + self.rejected_batches
    }
}
