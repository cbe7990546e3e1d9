use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::handler::HandlerWithoutStateExt;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    analysis_progress_handler, analyze_bulk_handler, download_results_handler, health_handler,
    not_found_handler, status_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let static_files = ServeDir::new(&state.settings.server.static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(not_found_handler.into_service());
    let upload_limit = state.settings.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/analyze-bulk",
            post(analyze_bulk_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/analysis-progress", get(analysis_progress_handler))
        .route("/api/status", get(status_handler))
        .route("/api/download-results", get(download_results_handler))
        .fallback_service(static_files)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
