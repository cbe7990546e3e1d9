use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Serialize;

use crate::domain::JobState;
use crate::presentation::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(flatten)]
    pub state: JobState,
    pub percent_complete: u8,
    pub timestamp: i64,
}

#[tracing::instrument(skip(state))]
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.job_store.snapshot().await;
    let percent_complete = snapshot.percent_complete();
    (
        StatusCode::OK,
        Json(StatusResponse {
            state: snapshot,
            percent_complete,
            timestamp: Utc::now().timestamp_millis(),
        }),
    )
}
