mod analyze;
mod download;
mod error_response;
mod health;
mod progress;
mod status;

pub use analyze::analyze_bulk_handler;
pub use download::download_results_handler;
pub use error_response::{ErrorResponse, not_found_handler};
pub use health::health_handler;
pub use progress::analysis_progress_handler;
pub use status::status_handler;
