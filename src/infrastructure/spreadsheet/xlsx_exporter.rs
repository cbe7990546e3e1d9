use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::application::ports::{ResultExporter, SpreadsheetError};
use crate::domain::ClassificationResult;

const SHEET_NAME: &str = "Analysis Results";
const HEADER: [&str; 3] = ["Keyword", "Match Type", "Status"];

pub struct XlsxResultExporter;

impl XlsxResultExporter {
    fn build(results: &[ClassificationResult]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(SHEET_NAME)?;

            for (col, title) in HEADER.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
            }

            for (index, result) in results.iter().enumerate() {
                let row = index as u32 + 1;
                worksheet.write_string(row, 0, &result.text)?;
                worksheet.write_string(row, 1, &result.category)?;
                worksheet.write_string(row, 2, result.outcome.label())?;
            }

            worksheet.set_column_width(0, 40)?;
            worksheet.set_column_width(1, 14)?;
            worksheet.set_column_width(2, 14)?;
        }

        workbook.save_to_buffer()
    }
}

impl ResultExporter for XlsxResultExporter {
    fn export(&self, results: &[ClassificationResult]) -> Result<Vec<u8>, SpreadsheetError> {
        Self::build(results).map_err(|e| SpreadsheetError::WriteFailed(e.to_string()))
    }

    fn content_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }

    fn file_name(&self) -> &'static str {
        "keyword-analysis-results.xlsx"
    }
}
