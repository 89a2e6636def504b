//! `.xlsx` writer for the cleaned table.
//!
//! Cells are written as text so identifiers keep their leading zeros. Empty
//! cells stay blank.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::error::ExportResult;
use crate::models::Table;

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Cleaned";

/// Workbook bytes holding `table` with a bold header row.
pub fn table_to_xlsx_bytes(table: &Table) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, column_number(col)?, name, &header_format)?;
    }

    for (idx, record) in table.records.iter().enumerate() {
        let row = u32::try_from(idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, value) in record.cells().iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row, column_number(col)?, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column_number(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}
