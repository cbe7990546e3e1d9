//! Events pushed to progress subscribers.
//!
//! Each event serializes as internally-tagged JSON (`"type": "progress"`, ...) so the
//! browser client can dispatch on `type` alone.

use chrono::Utc;
use serde::Serialize;

use super::{JobId, JobState, JobStatus, OutcomeTally, ProgressCounts};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    /// First event on every new stream.
    Connected,

    /// Current job state, sent to a subscriber that joins while a job is running.
    Snapshot {
        job_id: Option<JobId>,
        status: JobStatus,
        processed: usize,
        total: usize,
        percent_complete: u8,
        current_item: String,
    },

    /// A job was accepted and its item loop is about to start.
    Start {
        job_id: JobId,
        total: usize,
        message: String,
    },

    /// An item is being sent to the oracle.
    Processing { item: String, category: String },

    /// Emitted after every recorded item.
    Progress {
        processed: usize,
        total: usize,
        percent_complete: u8,
        current_item: String,
        errored: usize,
    },

    /// The job ran to the end of its item list.
    Completed {
        processed: usize,
        total: usize,
        #[serde(flatten)]
        tally: OutcomeTally,
        message: String,
    },

    /// The job was aborted before finishing.
    Error {
        message: String,
        processed: usize,
        total: usize,
    },

    Heartbeat,
}

impl ProgressEvent {
    pub fn snapshot(state: &JobState) -> Self {
        ProgressEvent::Snapshot {
            job_id: state.id,
            status: state.status,
            processed: state.processed_count,
            total: state.total_count,
            percent_complete: state.percent_complete(),
            current_item: state.current_item.clone(),
        }
    }

    pub fn progress(counts: ProgressCounts, current_item: &str, errored: usize) -> Self {
        ProgressEvent::Progress {
            processed: counts.processed,
            total: counts.total,
            percent_complete: counts.percent_complete,
            current_item: current_item.to_string(),
            errored,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::Connected => "connected",
            ProgressEvent::Snapshot { .. } => "snapshot",
            ProgressEvent::Start { .. } => "start",
            ProgressEvent::Processing { .. } => "processing",
            ProgressEvent::Progress { .. } => "progress",
            ProgressEvent::Completed { .. } => "completed",
            ProgressEvent::Error { .. } => "error",
            ProgressEvent::Heartbeat => "heartbeat",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Error { .. }
        )
    }
}

/// An event stamped with its publish time in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressMessage {
    #[serde(flatten)]
    pub event: ProgressEvent,
    pub timestamp: i64,
}

impl ProgressMessage {
    pub fn now(event: ProgressEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
