use topicsieve::application::services::{ExportableResults, JobStore};
use topicsieve::domain::{ClassificationResult, Item, JobStatus, Outcome};

fn result(text: &str, outcome: Outcome) -> ClassificationResult {
    ClassificationResult::new(&Item::new(text, "Broad"), outcome)
}

#[tokio::test]
async fn given_idle_store_when_beginning_then_processing_with_fresh_counters() {
    let store = JobStore::new();

    let id = store.try_begin("running", 3).await.unwrap();
    let state = store.snapshot().await;

    assert_eq!(state.id, Some(id));
    assert_eq!(state.status, JobStatus::Processing);
    assert!(state.is_processing);
    assert_eq!(state.topic, "running");
    assert_eq!(state.total_count, 3);
    assert_eq!(state.processed_count, 0);
    assert!(state.started_at.is_some());
}

#[tokio::test]
async fn given_running_job_when_beginning_again_then_rejected_and_state_untouched() {
    let store = JobStore::new();
    let first = store.try_begin("running", 3).await.unwrap();

    assert!(store.try_begin("cooking", 10).await.is_err());

    let state = store.snapshot().await;
    assert_eq!(state.id, Some(first));
    assert_eq!(state.topic, "running");
    assert_eq!(state.total_count, 3);
}

#[tokio::test]
async fn given_results_when_recorded_then_processed_count_advances_by_one_each() {
    let store = JobStore::new();
    store.try_begin("running", 3).await.unwrap();

    let first = store.record(result("a", Outcome::Relevant)).await;
    let second = store.record(result("b", Outcome::NotRelevant)).await;

    assert_eq!(first.counts.processed, 1);
    assert_eq!(second.counts.processed, 2);
    assert_eq!(second.counts.percent_complete, 67);
    assert_eq!(second.tally.relevant, 1);
    assert_eq!(second.tally.not_relevant, 1);
}

#[tokio::test]
async fn given_errored_result_when_recorded_then_error_list_names_the_item() {
    let store = JobStore::new();
    store.try_begin("running", 1).await.unwrap();

    let summary = store
        .record(result("a", Outcome::Errored("HTTP 500".to_string())))
        .await;
    let state = store.snapshot().await;

    assert_eq!(summary.tally.errored, 1);
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].item.as_deref(), Some("a"));
    assert_eq!(state.errors[0].message, "HTTP 500");
}

#[tokio::test]
async fn given_running_job_when_completed_then_idle_for_new_submissions() {
    let store = JobStore::new();
    store.try_begin("running", 1).await.unwrap();
    store.set_current_item("a").await;
    store.record(result("a", Outcome::Relevant)).await;

    store.complete().await;
    let state = store.snapshot().await;

    assert_eq!(state.status, JobStatus::Completed);
    assert!(!state.is_processing);
    assert!(state.current_item.is_empty());
    assert!(store.try_begin("cooking", 2).await.is_ok());
}

#[tokio::test]
async fn given_running_job_when_failed_then_error_recorded_and_not_processing() {
    let store = JobStore::new();
    store.try_begin("running", 2).await.unwrap();

    let summary = store.fail("API key is not configured").await;
    let state = store.snapshot().await;

    assert_eq!(summary.counts.processed, 0);
    assert_eq!(state.status, JobStatus::Errored);
    assert!(!state.is_processing);
    assert_eq!(state.errors.last().unwrap().item, None);
    assert_eq!(state.errors.last().unwrap().message, "API key is not configured");
}

#[tokio::test]
async fn given_job_lifecycle_when_asking_for_export_then_reflects_state() {
    let store = JobStore::new();
    assert_eq!(store.exportable_results().await, ExportableResults::Empty);

    store.try_begin("running", 1).await.unwrap();
    assert_eq!(store.exportable_results().await, ExportableResults::Processing);

    store.record(result("a", Outcome::Relevant)).await;
    store.complete().await;

    match store.exportable_results().await {
        ExportableResults::Ready(results) => {
            assert_eq!(results, vec![result("a", Outcome::Relevant)]);
        }
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test]
async fn given_idle_store_when_setting_current_item_then_ignored() {
    let store = JobStore::new();

    store.set_current_item("stray").await;

    assert!(store.snapshot().await.current_item.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_reader_inside_read_with_when_completing_concurrently_then_completion_waits() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    let store = Arc::new(JobStore::new());
    store.try_begin("running", 1).await.unwrap();
    let completed = Arc::new(AtomicBool::new(false));

    let completer = {
        let store = Arc::clone(&store);
        let completed = Arc::clone(&completed);
        move || {
            tokio::spawn(async move {
                store.complete().await;
                completed.store(true, Ordering::SeqCst);
            })
        }
    };

    let (seen_processing, completed_while_reading, handle) = store
        .read_with(|state| {
            let handle = completer();
            std::thread::sleep(Duration::from_millis(100));
            (
                state.is_processing,
                completed.load(Ordering::SeqCst),
                handle,
            )
        })
        .await;
    handle.await.unwrap();

    assert!(seen_processing);
    assert!(!completed_while_reading);
    assert!(completed.load(Ordering::SeqCst));
    assert_eq!(store.snapshot().await.status, JobStatus::Completed);
}
