//! Delays between fetch attempts.
//!
//! [`BackoffConfig`] decides how long the fetcher waits after a failed
//! attempt. The service default is a fixed one-second pause; exponential
//! growth and jitter are available for quota-limited deployments.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Delay policy between attempts, with optional exponential growth and jitter.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use trivia_forge::backend::BackoffConfig;
///
/// let fixed = BackoffConfig::fixed(Duration::from_secs(1));
/// assert_eq!(fixed.delay_for_attempt(0), Duration::from_secs(1));
/// assert_eq!(fixed.delay_for_attempt(5), Duration::from_secs(1));
///
/// assert_eq!(BackoffConfig::none().delay_for_attempt(3), Duration::ZERO);
/// ```
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,

    /// Multiplier applied to the delay after each further failure.
    /// Delay grows: initial, initial * multiplier, initial * multiplier^2, ...
    pub multiplier: f64,

    /// Upper bound for any single delay, including provider `Retry-After`.
    pub max_delay: Duration,

    /// Jitter strategy.
    pub jitter: JitterStrategy,

    /// Whether to wait for the provider's `Retry-After` instead of the
    /// computed delay when one is supplied.
    pub respect_retry_after: bool,
}

/// Jitter strategy to prevent thundering herd on shared quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterStrategy {
    /// No jitter. Delay is exactly the calculated value.
    None,

    /// Full jitter: random value in `[0, calculated_delay]`.
    Full,

    /// Equal jitter: `calculated_delay/2 + random in [0, calculated_delay/2]`.
    Equal,
}

impl BackoffConfig {
    /// Constant delay between attempts, no jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            multiplier: 1.0,
            max_delay: delay.max(Duration::from_secs(60)),
            jitter: JitterStrategy::None,
            respect_retry_after: true,
        }
    }

    /// No waiting at all. Used by tests and local mocks.
    pub fn none() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
            jitter: JitterStrategy::None,
            respect_retry_after: false,
        }
    }

    /// Grow each delay by `multiplier` instead of repeating it.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the delay after failed attempt N (0-indexed).
    ///
    /// The base delay is `initial_delay * multiplier^attempt`, capped at
    /// `max_delay`. Jitter is then applied according to the configured strategy.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        let jittered = match self.jitter {
            JitterStrategy::None => capped,
            JitterStrategy::Full => fastrand::f64() * capped,
            JitterStrategy::Equal => capped / 2.0 + fastrand::f64() * (capped / 2.0),
        };

        Duration::from_secs_f64(jittered)
    }

    /// The delay to use after failed attempt N, given the provider's
    /// `Retry-After` (if any). Provider hints are capped at `max_delay`.
    pub fn delay_with_hint(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) if self.respect_retry_after => hint.min(self.max_delay),
            _ => self.delay_for_attempt(attempt),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl FromStr for JitterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(JitterStrategy::None),
            "full" => Ok(JitterStrategy::Full),
            "equal" => Ok(JitterStrategy::Equal),
            other => Err(format!(
                "unknown jitter strategy '{}' (expected none, full or equal)",
                other
            )),
        }
    }
}

impl fmt::Display for JitterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JitterStrategy::None => "none",
            JitterStrategy::Full => "full",
            JitterStrategy::Equal => "equal",
        })
    }
}
