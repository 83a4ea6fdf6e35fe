//! Retry configuration.

use serde_json::json;
use std::time::Duration;
use xai_sdk_core::{Code, Status};

/// Configuration for retry behavior.
///
/// The default is the service policy every xAI channel is created with:
/// five attempts, exponential backoff from 100 ms to 1 s with multiplier 2,
/// retrying only `UNAVAILABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Wait strategy.
    pub wait: WaitStrategy,
    /// Retry condition.
    pub retry_on: RetryCondition,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            wait: WaitStrategy::ExponentialJitter {
                initial: Duration::from_millis(100),
                max: Duration::from_secs(1),
                multiplier: 2.0,
            },
            retry_on: RetryCondition::default(),
        }
    }
}

impl RetryConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max attempts.
    #[must_use]
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the wait strategy.
    #[must_use]
    pub fn wait(mut self, strategy: WaitStrategy) -> Self {
        self.wait = strategy;
        self
    }

    /// Use fixed delay.
    #[must_use]
    pub fn fixed(mut self, delay: Duration) -> Self {
        self.wait = WaitStrategy::Fixed(delay);
        self
    }

    /// Set retry condition.
    #[must_use]
    pub fn retry_on(mut self, condition: RetryCondition) -> Self {
        self.retry_on = condition;
        self
    }

    /// Create config that never retries.
    pub fn no_retry() -> Self {
        Self::new().max_attempts(1)
    }

    /// The policy as a gRPC service config document, applying to every method.
    pub fn service_config_json(&self) -> serde_json::Value {
        let (initial, max, multiplier) = match self.wait {
            WaitStrategy::None => (Duration::ZERO, Duration::ZERO, 1.0),
            WaitStrategy::Fixed(d) => (d, d, 1.0),
            WaitStrategy::ExponentialJitter {
                initial,
                max,
                multiplier,
            } => (initial, max, multiplier),
        };
        let codes: Vec<String> = self
            .retry_on
            .codes
            .iter()
            .map(|code| code_name(*code))
            .collect();

        json!({
            "methodConfig": [{
                "name": [{}],
                "retryPolicy": {
                    "maxAttempts": self.max_attempts,
                    "initialBackoff": format!("{}s", initial.as_secs_f64()),
                    "maxBackoff": format!("{}s", max.as_secs_f64()),
                    "backoffMultiplier": multiplier,
                    "retryableStatusCodes": codes,
                }
            }]
        })
    }
}

/// Strategy for waiting between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitStrategy {
    /// No waiting.
    None,
    /// Fixed delay.
    Fixed(Duration),
    /// Exponential backoff with full jitter: the wait before retry `n` is
    /// uniform in `[0, min(initial * multiplier^(n-1), max)]`.
    ExponentialJitter {
        /// Initial backoff ceiling.
        initial: Duration,
        /// Maximum backoff ceiling.
        max: Duration,
        /// Growth of the ceiling per attempt.
        multiplier: f64,
    },
}

impl WaitStrategy {
    /// The upper bound of the wait after failed attempt `attempt` (1-indexed).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        match self {
            WaitStrategy::None => Duration::ZERO,
            WaitStrategy::Fixed(d) => *d,
            WaitStrategy::ExponentialJitter {
                initial,
                max,
                multiplier,
            } => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let ceiling = initial.as_secs_f64() * multiplier.powi(exponent);
                Duration::from_secs_f64(ceiling.min(max.as_secs_f64()).max(0.0))
            }
        }
    }

    /// Calculate the wait duration after failed attempt `attempt`.
    pub fn calculate(&self, attempt: u32) -> Duration {
        match self {
            WaitStrategy::ExponentialJitter { .. } => self.ceiling(attempt).mul_f64(random_unit()),
            other => other.ceiling(attempt),
        }
    }
}

/// Condition for retrying.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryCondition {
    /// Status codes to retry on.
    pub codes: Vec<Code>,
}

impl Default for RetryCondition {
    fn default() -> Self {
        Self {
            codes: vec![Code::Unavailable],
        }
    }
}

impl RetryCondition {
    /// A condition that retries nothing.
    pub fn none() -> Self {
        Self { codes: Vec::new() }
    }

    /// Add status codes to retry on.
    #[must_use]
    pub fn on_codes(mut self, codes: impl IntoIterator<Item = Code>) -> Self {
        self.codes.extend(codes);
        self
    }

    /// Check if a failed call should be retried.
    pub fn should_retry(&self, status: &Status) -> bool {
        self.codes.contains(&status.code())
    }
}

/// The canonical upper-snake name of a status code.
fn code_name(code: Code) -> String {
    let name = format!("{code:?}");
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

/// A random factor in `[0.0, 1.0)`.
fn random_unit() -> f64 {
    use rand::Rng;
    rand::thread_rng().gen::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_on.codes, vec![Code::Unavailable]);
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 200)]
    #[case(3, 400)]
    #[case(4, 800)]
    #[case(5, 1000)]
    #[case(9, 1000)]
    fn test_exponential_ceiling(#[case] attempt: u32, #[case] millis: u64) {
        let wait = RetryConfig::default().wait;
        assert_eq!(wait.ceiling(attempt), Duration::from_millis(millis));
    }

    #[test]
    fn test_jitter_within_ceiling() {
        let wait = RetryConfig::default().wait;
        for attempt in 1..=6 {
            let delay = wait.calculate(attempt);
            assert!(delay <= wait.ceiling(attempt));
        }
    }

    #[test]
    fn test_fixed_wait() {
        let strategy = WaitStrategy::Fixed(Duration::from_secs(1));
        assert_eq!(strategy.calculate(1), Duration::from_secs(1));
        assert_eq!(strategy.calculate(3), Duration::from_secs(1));
        assert_eq!(WaitStrategy::None.calculate(2), Duration::ZERO);
    }

    #[rstest]
    #[case(Code::Unavailable, true)]
    #[case(Code::DeadlineExceeded, false)]
    #[case(Code::InvalidArgument, false)]
    #[case(Code::Internal, false)]
    fn test_default_condition(#[case] code: Code, #[case] retry: bool) {
        let condition = RetryCondition::default();
        assert_eq!(condition.should_retry(&Status::new(code, "")), retry);
    }

    #[test]
    fn test_condition_builder() {
        let condition = RetryCondition::none().on_codes([Code::ResourceExhausted]);
        assert!(condition.should_retry(&Status::resource_exhausted("slow down")));
        assert!(!condition.should_retry(&Status::unavailable("down")));
    }

    #[test]
    fn test_service_config_json() {
        let config = RetryConfig::default().service_config_json();
        assert_eq!(
            config,
            json!({
                "methodConfig": [{
                    "name": [{}],
                    "retryPolicy": {
                        "maxAttempts": 5,
                        "initialBackoff": "0.1s",
                        "maxBackoff": "1s",
                        "backoffMultiplier": 2.0,
                        "retryableStatusCodes": ["UNAVAILABLE"],
                    }
                }]
            })
        );
    }

    #[test]
    fn test_code_name() {
        assert_eq!(code_name(Code::DeadlineExceeded), "DEADLINE_EXCEEDED");
        assert_eq!(code_name(Code::Ok), "OK");
    }
}
