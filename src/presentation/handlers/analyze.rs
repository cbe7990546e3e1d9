use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::SubmitError;
use crate::presentation::state::AppState;

use super::error_response::error_response;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub message: String,
    pub job_id: String,
    pub total_items: usize,
}

/// Accepts a keyword workbook (`file`) and a `topic`, starts the batch job and returns
/// without waiting for it.
#[tracing::instrument(skip(state, multipart))]
pub async fn analyze_bulk_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    if state.job_store.is_processing().await {
        tracing::warn!("Analyze request while a job is running");
        return error_response(StatusCode::CONFLICT, SubmitError::Conflict.to_string());
    }

    let mut file: Option<Bytes> = None;
    let mut topic: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                );
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => match field.bytes().await {
                Ok(data) => file = Some(data),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read file bytes");
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file: {}", e),
                    );
                }
            },
            Some("topic") => match field.text().await {
                Ok(text) => topic = Some(text),
                Err(e) => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read topic: {}", e),
                    );
                }
            },
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    let Some(file) = file else {
        tracing::warn!("Analyze request with no file");
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };
    let topic = topic.unwrap_or_default();
    if topic.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Topic is required");
    }

    tracing::debug!(bytes = file.len(), "Keyword workbook received");

    let items = match state.spreadsheet_reader.read_items(&file) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected keyword workbook");
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid workbook: {}", e));
        }
    };

    match state.scheduler.submit(items, &topic).await {
        Ok(submitted) => (
            StatusCode::OK,
            Json(AnalyzeResponse {
                success: true,
                message: "Analysis started".to_string(),
                job_id: submitted.job_id.to_string(),
                total_items: submitted.total_items,
            }),
        )
            .into_response(),
        Err(SubmitError::Validation(message)) => {
            error_response(StatusCode::BAD_REQUEST, message)
        }
        Err(SubmitError::Conflict) => {
            tracing::warn!("Analyze request while a job is running");
            error_response(StatusCode::CONFLICT, SubmitError::Conflict.to_string())
        }
    }
}
