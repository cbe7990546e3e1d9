use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    ClassificationResult, JobError, JobId, JobState, JobStatus, JobSummary, Outcome,
};

/// Holder of the single process-wide job state.
///
/// `try_begin` is the only way into `Processing` and performs its check and its write under
/// one write lock, so two submissions can never both start a job.
pub struct JobStore {
    state: RwLock<JobState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a job is already processing")]
pub struct JobAlreadyRunning;

#[derive(Debug, Clone, PartialEq)]
pub enum ExportableResults {
    Processing,
    Empty,
    Ready(Vec<ClassificationResult>),
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(JobState::idle()),
        }
    }

    pub async fn try_begin(&self, topic: &str, total: usize) -> Result<JobId, JobAlreadyRunning> {
        let mut state = self.state.write().await;
        if state.is_processing {
            return Err(JobAlreadyRunning);
        }

        let id = JobId::new();
        *state = JobState::started(id, topic.to_string(), total);
        Ok(id)
    }

    pub async fn set_current_item(&self, item: &str) {
        let mut state = self.state.write().await;
        if state.is_processing {
            state.current_item = item.to_string();
            state.last_updated_at = Some(Utc::now());
        }
    }

    /// Appends one result and advances the processed count by exactly one.
    pub async fn record(&self, result: ClassificationResult) -> JobSummary {
        let mut state = self.state.write().await;

        state.tally.add(&result.outcome);
        if let Outcome::Errored(reason) = &result.outcome {
            state.errors.push(JobError::for_item(&result.text, reason));
        }
        state.results.push(result);
        state.processed_count += 1;
        state.last_updated_at = Some(Utc::now());

        state.summary()
    }

    pub async fn complete(&self) -> JobSummary {
        let mut state = self.state.write().await;
        state.status = JobStatus::Completed;
        state.is_processing = false;
        state.current_item.clear();
        state.last_updated_at = Some(Utc::now());
        state.summary()
    }

    pub async fn fail(&self, message: &str) -> JobSummary {
        let mut state = self.state.write().await;
        state.status = JobStatus::Errored;
        state.is_processing = false;
        state.current_item.clear();
        state.errors.push(JobError::for_job(message));
        state.last_updated_at = Some(Utc::now());
        state.summary()
    }

    pub async fn snapshot(&self) -> JobState {
        self.state.read().await.clone()
    }

    /// Runs `f` against the current state while holding the read lock, so no state
    /// transition can land between what `f` observes and what it does.
    pub async fn read_with<R>(&self, f: impl FnOnce(&JobState) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    pub async fn is_processing(&self) -> bool {
        self.state.read().await.is_processing
    }

    /// Results of the last finished job, if there are any to hand out.
    pub async fn exportable_results(&self) -> ExportableResults {
        let state = self.state.read().await;
        if state.is_processing {
            ExportableResults::Processing
        } else if state.results.is_empty() {
            ExportableResults::Empty
        } else {
            ExportableResults::Ready(state.results.clone())
        }
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
