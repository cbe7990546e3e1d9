use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ClassificationResult, JobId, JobStatus, Outcome};

/// A failure recorded against the running job.
///
/// `item` is `None` for job-level failures that happened outside the item loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobError {
    pub item: Option<String>,
    pub message: String,
}

impl JobError {
    pub fn for_item(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: Some(item.into()),
            message: message.into(),
        }
    }

    pub fn for_job(message: impl Into<String>) -> Self {
        Self {
            item: None,
            message: message.into(),
        }
    }
}

/// State of the in-flight or most recently finished batch job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    #[serde(rename = "jobId")]
    pub id: Option<JobId>,
    pub status: JobStatus,
    pub is_processing: bool,
    pub topic: String,
    pub processed_count: usize,
    pub total_count: usize,
    pub results: Vec<ClassificationResult>,
    pub errors: Vec<JobError>,
    pub tally: OutcomeTally,
    pub current_item: String,
    pub started_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl JobState {
    pub fn idle() -> Self {
        Self {
            id: None,
            status: JobStatus::Idle,
            is_processing: false,
            topic: String::new(),
            processed_count: 0,
            total_count: 0,
            results: Vec::new(),
            errors: Vec::new(),
            tally: OutcomeTally::default(),
            current_item: String::new(),
            started_at: None,
            last_updated_at: None,
        }
    }

    pub fn started(id: JobId, topic: String, total_count: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Some(id),
            status: JobStatus::Processing,
            is_processing: true,
            topic,
            processed_count: 0,
            total_count,
            results: Vec::with_capacity(total_count),
            errors: Vec::new(),
            tally: OutcomeTally::default(),
            current_item: String::new(),
            started_at: Some(now),
            last_updated_at: Some(now),
        }
    }

    pub fn percent_complete(&self) -> u8 {
        percent_complete(self.processed_count, self.total_count)
    }

    pub fn counts(&self) -> ProgressCounts {
        ProgressCounts {
            processed: self.processed_count,
            total: self.total_count,
            percent_complete: self.percent_complete(),
        }
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            counts: self.counts(),
            tally: self.tally,
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCounts {
    pub processed: usize,
    pub total: usize,
    pub percent_complete: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSummary {
    pub counts: ProgressCounts,
    pub tally: OutcomeTally,
}

/// `round(processed / total * 100)`, clamped to 100. An empty job reports 0.
pub fn percent_complete(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = processed as f64 / total as f64;
    (ratio * 100.0).round().min(100.0) as u8
}

/// Tally of outcomes over a finished result list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeTally {
    pub relevant: usize,
    pub not_relevant: usize,
    pub errored: usize,
}

impl OutcomeTally {
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Relevant => self.relevant += 1,
            Outcome::NotRelevant => self.not_relevant += 1,
            Outcome::Errored(_) => self.errored += 1,
        }
    }

    pub fn from_results(results: &[ClassificationResult]) -> Self {
        results.iter().fold(Self::default(), |mut tally, result| {
            tally.add(&result.outcome);
            tally
        })
    }
}
