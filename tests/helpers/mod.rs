#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_xlsxwriter::Workbook;
use tokio::sync::Notify;

use topicsieve::application::ports::{ProgressPublisher, RelevanceOracle};
use topicsieve::application::services::{
    BatchMode, BatchPolicy, BatchScheduler, JobStore, OracleClient, Pacer, RetryPolicy,
};
use topicsieve::domain::{Item, ProgressEvent};
use topicsieve::infrastructure::llm::MockRelevanceOracle;

/// Publisher that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ProgressEvent>>,
    notify: Notify,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn terminal_events(&self) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter(ProgressEvent::is_terminal)
            .collect()
    }

    pub fn progress_counts(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Progress { processed, .. } => Some(processed),
                _ => None,
            })
            .collect()
    }

    pub async fn wait_for_terminal(&self) {
        loop {
            if !self.terminal_events().is_empty() {
                return;
            }
            self.notify.notified().await;
        }
    }
}

impl ProgressPublisher for RecordingPublisher {
    fn publish(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
        self.notify.notify_one();
    }
}

pub fn no_delay_policy(mode: BatchMode, batch_size: usize) -> BatchPolicy {
    BatchPolicy {
        batch_size,
        mode,
        inter_item_delay: Duration::ZERO,
        inter_batch_delay: Duration::ZERO,
        consecutive_error_threshold: 0,
        consecutive_error_pause: Duration::ZERO,
    }
}

pub fn retry_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        backoff_base: Duration::from_secs(5),
        rate_limit_cooldown: Duration::from_secs(60),
        call_timeout: Duration::from_secs(30),
    }
}

pub fn unlimited_pacer() -> Arc<Pacer> {
    Arc::new(Pacer::new(10_000, Duration::from_secs(60)))
}

pub struct SchedulerHarness {
    pub scheduler: BatchScheduler,
    pub job_store: Arc<JobStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub oracle: Arc<MockRelevanceOracle>,
}

pub fn scheduler_harness(
    oracle: MockRelevanceOracle,
    retry: RetryPolicy,
    batch: BatchPolicy,
) -> SchedulerHarness {
    let oracle = Arc::new(oracle);
    let dyn_oracle: Arc<dyn RelevanceOracle> = oracle.clone();
    let oracle_client = Arc::new(OracleClient::new(dyn_oracle, unlimited_pacer(), retry));
    let job_store = Arc::new(JobStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let dyn_publisher: Arc<dyn ProgressPublisher> = publisher.clone();

    SchedulerHarness {
        scheduler: BatchScheduler::new(oracle_client, Arc::clone(&job_store), dyn_publisher, batch),
        job_store,
        publisher,
        oracle,
    }
}

pub fn items(pairs: &[(&str, &str)]) -> Vec<Item> {
    pairs
        .iter()
        .map(|(text, category)| Item::new(*text, *category))
        .collect()
}

/// Builds an `.xlsx` with a header row followed by `rows`.
pub fn keyword_workbook(rows: &[(&str, Option<&str>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Keyword").unwrap();
        worksheet.write_string(0, 1, "Match Type").unwrap();
        for (index, (keyword, category)) in rows.iter().enumerate() {
            let row = index as u32 + 1;
            worksheet.write_string(row, 0, *keyword).unwrap();
            if let Some(category) = category {
                worksheet.write_string(row, 1, *category).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// Reads every row of the first worksheet as strings.
pub fn read_sheet(data: &[u8]) -> Vec<Vec<String>> {
    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};

    let mut workbook: Xlsx<std::io::Cursor<&[u8]>> =
        open_workbook_from_rs(std::io::Cursor::new(data)).unwrap();
    let range = workbook.worksheet_range_at(0).unwrap().unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

/// Asserts `start.elapsed()` is `expected`, allowing for the timer wheel's millisecond
/// rounding.
#[track_caller]
pub fn assert_elapsed(start: tokio::time::Instant, expected: Duration) {
    assert_offset(start, tokio::time::Instant::now(), expected);
}

#[track_caller]
pub fn assert_offset(start: tokio::time::Instant, at: tokio::time::Instant, expected: Duration) {
    let actual = at.duration_since(start);
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(20),
        "expected ~{expected:?}, got {actual:?}"
    );
}
