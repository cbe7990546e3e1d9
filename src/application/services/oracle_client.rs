use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{OracleError, RelevanceOracle};
use crate::domain::{ClassificationResult, Item, Outcome};

use super::Pacer;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub rate_limit_cooldown: Duration,
    pub call_timeout: Duration,
}

impl RetryPolicy {
    /// `backoff_base * 2^attempt`, where `attempt` is the zero-based retry number.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.backoff_base.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(5),
            rate_limit_cooldown: Duration::from_secs(60),
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Wraps single oracle calls with pacing, a per-call timeout and bounded retries.
pub struct OracleClient {
    oracle: Arc<dyn RelevanceOracle>,
    pacer: Arc<Pacer>,
    policy: RetryPolicy,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn RelevanceOracle>, pacer: Arc<Pacer>, policy: RetryPolicy) -> Self {
        Self {
            oracle,
            pacer,
            policy,
        }
    }

    pub fn preflight(&self) -> Result<(), OracleError> {
        self.oracle.preflight()
    }

    /// Classifies one item, retrying until it succeeds or the retry budget is spent.
    ///
    /// A 429 sleeps the cooldown and repeats the same attempt. Every other retryable error
    /// backs off exponentially and consumes one retry; after `max_retries` retries the last
    /// error is returned.
    pub async fn classify(
        &self,
        item: &Item,
        topic: &str,
    ) -> Result<ClassificationResult, OracleError> {
        let mut attempt: u32 = 0;

        loop {
            self.pacer.acquire().await;

            let call = self.oracle.ask(&item.text, topic);
            let error = match tokio::time::timeout(self.policy.call_timeout, call).await {
                Ok(Ok(answer)) => {
                    let outcome = Outcome::from_answer(&answer);
                    tracing::debug!(
                        keyword = %item.text,
                        answer = %answer.trim(),
                        outcome = outcome.label(),
                        "Keyword classified"
                    );
                    return Ok(ClassificationResult::new(item, outcome));
                }
                Ok(Err(OracleError::RateLimited)) => {
                    tracing::warn!(
                        keyword = %item.text,
                        cooldown_ms = self.policy.rate_limit_cooldown.as_millis() as u64,
                        "Rate limited by oracle, cooling down"
                    );
                    tokio::time::sleep(self.policy.rate_limit_cooldown).await;
                    continue;
                }
                Ok(Err(e)) => e,
                Err(_) => OracleError::TransportError(format!(
                    "request timed out after {}ms",
                    self.policy.call_timeout.as_millis()
                )),
            };

            if !error.is_retryable() || attempt >= self.policy.max_retries {
                tracing::warn!(
                    keyword = %item.text,
                    attempts = attempt + 1,
                    error = %error,
                    "Giving up on keyword"
                );
                return Err(error);
            }

            let delay = self.policy.backoff_for(attempt);
            tracing::debug!(
                keyword = %item.text,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Oracle call failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
