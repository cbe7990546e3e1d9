use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};

use crate::application::ports::{SpreadsheetError, SpreadsheetReader};
use crate::domain::Item;

/// Reads items from the first worksheet of an `.xlsx` upload.
///
/// Worksheet row 1 is the header. Column A holds the keyword, column B the match type.
pub struct XlsxItemReader;

impl SpreadsheetReader for XlsxItemReader {
    fn read_items(&self, data: &[u8]) -> Result<Vec<Item>, SpreadsheetError> {
        let mut workbook: Xlsx<Cursor<&[u8]>> = open_workbook_from_rs(Cursor::new(data))
            .map_err(|e: calamine::XlsxError| SpreadsheetError::Unreadable(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SpreadsheetError::NoWorksheet)?
            .map_err(|e| SpreadsheetError::Unreadable(e.to_string()))?;

        let (Some((start_row, _)), Some((end_row, _))) = (range.start(), range.end()) else {
            return Ok(Vec::new());
        };

        let mut items = Vec::new();
        for row in start_row.max(1)..=end_row {
            let text = range.get_value((row, 0)).map(cell_text);
            let category = range.get_value((row, 1)).map(cell_text);
            if let Some(item) = Item::from_cells(text.as_deref(), category.as_deref()) {
                items.push(item);
            }
        }

        tracing::debug!(items = items.len(), "Parsed keyword workbook");
        Ok(items)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
