use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::services::ExportableResults;
use crate::presentation::state::AppState;

use super::error_response::error_response;

#[tracing::instrument(skip(state))]
pub async fn download_results_handler(State(state): State<AppState>) -> Response {
    let results = match state.job_store.exportable_results().await {
        ExportableResults::Ready(results) => results,
        ExportableResults::Empty => {
            return error_response(StatusCode::NOT_FOUND, "No results available");
        }
        ExportableResults::Processing => {
            return error_response(StatusCode::CONFLICT, "Analysis still in progress");
        }
    };

    let exporter = &state.result_exporter;
    match exporter.export(&results) {
        Ok(bytes) => {
            tracing::info!(rows = results.len(), bytes = bytes.len(), "Results exported");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, exporter.content_type().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename={}", exporter.file_name()),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to export results");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Download failed")
        }
    }
}
