use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::Instrument;

use crate::application::ports::{OracleError, ProgressPublisher};
use crate::domain::{ClassificationResult, Item, JobId, JobSummary, Outcome, ProgressEvent};

use super::{JobStore, OracleClient};

const COMPLETED_MESSAGE: &str = "Analysis completed successfully!";

/// How the items of one batch are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Await each item before starting the next.
    Sequential,
    /// Launch every item of the batch, staggered by the inter-item delay.
    Concurrent,
}

#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub mode: BatchMode,
    pub inter_item_delay: Duration,
    pub inter_batch_delay: Duration,
    /// Consecutive failed items that trigger a pause. Zero disables the breaker.
    pub consecutive_error_threshold: u32,
    pub consecutive_error_pause: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 10,
            mode: BatchMode::Concurrent,
            inter_item_delay: Duration::from_millis(300),
            inter_batch_delay: Duration::from_secs(3),
            consecutive_error_threshold: 3,
            consecutive_error_pause: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub total_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),
    #[error("Analysis already in progress")]
    Conflict,
}

#[derive(Debug, thiserror::Error)]
pub enum JobSetupError {
    #[error("oracle unavailable: {0}")]
    Oracle(#[from] OracleError),
}

/// Drives one job at a time through the oracle in ordered batches.
#[derive(Clone)]
pub struct BatchScheduler {
    oracle_client: Arc<OracleClient>,
    job_store: Arc<JobStore>,
    publisher: Arc<dyn ProgressPublisher>,
    policy: BatchPolicy,
}

impl BatchScheduler {
    pub fn new(
        oracle_client: Arc<OracleClient>,
        job_store: Arc<JobStore>,
        publisher: Arc<dyn ProgressPublisher>,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            oracle_client,
            job_store,
            publisher,
            policy,
        }
    }

    /// Validates and accepts a job, then returns while the items are processed in the
    /// background.
    pub async fn submit(&self, items: Vec<Item>, topic: &str) -> Result<SubmittedJob, SubmitError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SubmitError::Validation("Topic is required".to_string()));
        }
        if items.is_empty() {
            return Err(SubmitError::Validation(
                "No keywords found in file".to_string(),
            ));
        }

        let total_items = items.len();
        let job_id = self
            .job_store
            .try_begin(topic, total_items)
            .await
            .map_err(|_| SubmitError::Conflict)?;

        tracing::info!(job_id = %job_id, total_items, topic = %topic, "Batch job accepted");

        self.publisher.publish(ProgressEvent::Start {
            job_id,
            total: total_items,
            message: "Starting analysis...".to_string(),
        });

        let supervisor = self.clone();
        let topic = topic.to_string();
        tokio::spawn(async move { supervisor.supervise(job_id, items, topic).await });

        Ok(SubmittedJob {
            job_id,
            total_items,
        })
    }

    /// Runs the job on its own task and writes exactly one terminal state, whether the run
    /// returns, fails during setup or panics.
    async fn supervise(self, job_id: JobId, items: Vec<Item>, topic: String) {
        let worker = self.clone();
        let span = tracing::info_span!("batch_job", job_id = %job_id);
        let run = tokio::spawn(async move { worker.run(items, topic).await }.instrument(span));

        match run.await {
            Ok(Ok(())) => {
                let summary = self.job_store.complete().await;
                tracing::info!(
                    job_id = %job_id,
                    processed = summary.counts.processed,
                    relevant = summary.tally.relevant,
                    errored = summary.tally.errored,
                    "Batch job completed"
                );
                self.publisher.publish(ProgressEvent::Completed {
                    processed: summary.counts.processed,
                    total: summary.counts.total,
                    tally: summary.tally,
                    message: COMPLETED_MESSAGE.to_string(),
                });
            }
            Ok(Err(e)) => self.abort(job_id, &e.to_string()).await,
            Err(join_error) => {
                self.abort(job_id, &format!("background task aborted: {}", join_error))
                    .await
            }
        }
    }

    async fn abort(&self, job_id: JobId, reason: &str) {
        tracing::error!(job_id = %job_id, error = %reason, "Batch job failed");
        let summary: JobSummary = self.job_store.fail(reason).await;
        self.publisher.publish(ProgressEvent::Error {
            message: format!("Processing failed: {}", reason),
            processed: summary.counts.processed,
            total: summary.counts.total,
        });
    }

    async fn run(&self, items: Vec<Item>, topic: String) -> Result<(), JobSetupError> {
        self.oracle_client.preflight()?;

        let batch_size = self.policy.batch_size.max(1);
        let batch_count = items.len().div_ceil(batch_size);
        let mut streak = ErrorStreak::new(self.policy.consecutive_error_threshold);

        for (index, batch) in items.chunks(batch_size).enumerate() {
            tracing::debug!(batch = index + 1, batch_count, size = batch.len(), "Starting batch");

            match self.policy.mode {
                BatchMode::Sequential => self.run_sequential(batch, &topic, &mut streak).await,
                BatchMode::Concurrent => self.run_concurrent(batch, &topic, &mut streak).await,
            }

            if index + 1 < batch_count {
                tokio::time::sleep(self.policy.inter_batch_delay).await;
            }
        }

        Ok(())
    }

    async fn run_sequential(&self, batch: &[Item], topic: &str, streak: &mut ErrorStreak) {
        for (index, item) in batch.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.policy.inter_item_delay).await;
            }

            let result = self.classify_item(item, topic).await;
            if self.record(result, streak).await {
                self.cool_down().await;
            }
        }
    }

    async fn run_concurrent(&self, batch: &[Item], topic: &str, streak: &mut ErrorStreak) {
        let stagger = self.policy.inter_item_delay;
        let calls: Vec<_> = batch
            .iter()
            .enumerate()
            .map(|(index, item)| async move {
                if index > 0 {
                    tokio::time::sleep(stagger.saturating_mul(index as u32)).await;
                }
                self.classify_item(item, topic).await
            })
            .collect();
        let mut in_flight = stream::iter(calls).buffered(batch.len().max(1));

        // Results arrive in item order. Breaker pauses wait for the batch to drain so
        // in-flight calls keep being polled; each trip still costs one full pause.
        let mut trips = 0u32;
        while let Some(result) = in_flight.next().await {
            if self.record(result, streak).await {
                trips += 1;
            }
        }

        for _ in 0..trips {
            self.cool_down().await;
        }
    }

    async fn classify_item(&self, item: &Item, topic: &str) -> ClassificationResult {
        self.publisher.publish(ProgressEvent::Processing {
            item: item.text.clone(),
            category: item.category.clone(),
        });
        self.job_store.set_current_item(&item.text).await;

        match self.oracle_client.classify(item, topic).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(keyword = %item.text, error = %e, "Keyword failed");
                ClassificationResult::new(item, Outcome::Errored(e.to_string()))
            }
        }
    }

    /// Stores the result, publishes progress and reports whether the breaker tripped.
    async fn record(&self, result: ClassificationResult, streak: &mut ErrorStreak) -> bool {
        let errored = result.outcome.is_errored();
        let text = result.text.clone();
        let summary = self.job_store.record(result).await;

        self.publisher.publish(ProgressEvent::progress(
            summary.counts,
            &text,
            summary.tally.errored,
        ));

        streak.observe(errored)
    }

    async fn cool_down(&self) {
        tracing::warn!(
            pause_ms = self.policy.consecutive_error_pause.as_millis() as u64,
            "Too many consecutive errors, pausing"
        );
        tokio::time::sleep(self.policy.consecutive_error_pause).await;
    }
}

struct ErrorStreak {
    threshold: u32,
    current: u32,
}

impl ErrorStreak {
    fn new(threshold: u32) -> Self {
        Self {
            threshold,
            current: 0,
        }
    }

    /// Returns true when this failure completes a streak; the streak then starts over.
    fn observe(&mut self, errored: bool) -> bool {
        if !errored {
            self.current = 0;
            return false;
        }

        self.current += 1;
        if self.threshold > 0 && self.current >= self.threshold {
            self.current = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_threshold_three_when_three_failures_then_streak_trips_once() {
        let mut streak = ErrorStreak::new(3);

        assert!(!streak.observe(true));
        assert!(!streak.observe(true));
        assert!(streak.observe(true));
        assert!(!streak.observe(true));
    }

    #[test]
    fn given_success_between_failures_when_observed_then_streak_resets() {
        let mut streak = ErrorStreak::new(2);

        assert!(!streak.observe(true));
        assert!(!streak.observe(false));
        assert!(!streak.observe(true));
        assert!(streak.observe(true));
    }

    #[test]
    fn given_zero_threshold_when_failing_then_never_trips() {
        let mut streak = ErrorStreak::new(0);

        for _ in 0..10 {
            assert!(!streak.observe(true));
        }
    }
}
