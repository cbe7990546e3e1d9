mod classification;
mod item;
mod job;
mod job_id;
mod job_status;
mod progress_event;

pub use classification::{ClassificationResult, Outcome};
pub use item::{DEFAULT_CATEGORY, Item};
pub use job::{
    JobError, JobState, JobSummary, OutcomeTally, ProgressCounts, percent_complete,
};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use progress_event::{ProgressEvent, ProgressMessage};
