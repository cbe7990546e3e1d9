mod progress_publisher;
mod relevance_oracle;
mod spreadsheet;

pub use progress_publisher::ProgressPublisher;
pub use relevance_oracle::{OracleError, RelevanceOracle};
pub use spreadsheet::{ResultExporter, SpreadsheetError, SpreadsheetReader};
