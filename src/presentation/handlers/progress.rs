use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};

use crate::domain::{ProgressEvent, ProgressMessage};
use crate::presentation::state::AppState;

/// Opens the progress event stream.
///
/// A client joining mid-job gets a snapshot of the running job before any live event.
#[tracing::instrument(skip(state))]
pub async fn analysis_progress_handler(State(state): State<AppState>) -> Response {
    // Subscribing under the read lock orders the snapshot before any terminal publish.
    let broadcaster = &state.broadcaster;
    let mut subscription = state
        .job_store
        .read_with(|current| {
            let initial = current
                .is_processing
                .then(|| ProgressEvent::snapshot(current));
            broadcaster.subscribe(initial)
        })
        .await;
    let retry = state.settings.progress.sse_retry();
    tracing::info!(subscriber = %subscription.id(), "Progress stream opened");

    let sse_stream = async_stream::stream! {
        let connected = ProgressMessage::now(ProgressEvent::Connected);
        yield Ok::<_, Infallible>(Event::default().retry(retry).data(connected.to_json()));

        while let Some(message) = subscription.recv().await {
            yield Ok(Event::default().data(message.to_json()));
        }
    };

    ([("x-accel-buffering", "no")], Sse::new(sse_stream)).into_response()
}
