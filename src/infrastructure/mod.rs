pub mod llm;
pub mod observability;
pub mod progress;
pub mod spreadsheet;
