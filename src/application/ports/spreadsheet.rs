use crate::domain::{ClassificationResult, Item};

/// Turns an uploaded workbook into the ordered item list.
pub trait SpreadsheetReader: Send + Sync {
    fn read_items(&self, data: &[u8]) -> Result<Vec<Item>, SpreadsheetError>;
}

/// Renders a result list as a downloadable workbook.
pub trait ResultExporter: Send + Sync {
    fn export(&self, results: &[ClassificationResult]) -> Result<Vec<u8>, SpreadsheetError>;

    fn content_type(&self) -> &'static str;

    fn file_name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("unreadable workbook: {0}")]
    Unreadable(String),
    #[error("workbook has no worksheet")]
    NoWorksheet,
    #[error("failed to write workbook: {0}")]
    WriteFailed(String),
}
