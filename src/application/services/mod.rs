mod batch_scheduler;
mod job_store;
mod oracle_client;
mod pacer;

pub use batch_scheduler::{
    BatchMode, BatchPolicy, BatchScheduler, JobSetupError, SubmitError, SubmittedJob,
};
pub use job_store::{ExportableResults, JobAlreadyRunning, JobStore};
pub use oracle_client::{OracleClient, RetryPolicy};
pub use pacer::Pacer;
