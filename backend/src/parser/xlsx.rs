//! `.xlsx` reader.
//!
//! Only the first worksheet is read. Every cell becomes a string: text
//! cells verbatim (so `007` keeps its zeros), numbers in their shortest
//! decimal form, blanks as `""`.

use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

use crate::error::{CsvError, CsvResult};
use crate::models::Table;

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// True when the bytes start like a zip container, as `.xlsx` files do.
pub fn is_xlsx(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_SIGNATURE)
}

/// Read the first worksheet; its first row holds the column names.
pub fn parse_xlsx_bytes(bytes: &[u8]) -> CsvResult<Table> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| CsvError::SpreadsheetError(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(CsvError::EmptyFile)?
        .map_err(|e| CsvError::SpreadsheetError(e.to_string()))?;

    let mut rows = range.rows();

    let headers: Vec<String> = rows
        .next()
        .ok_or(CsvError::EmptyFile)?
        .iter()
        .map(|cell| cell_to_string(cell).trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let records = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .collect();

    Ok(Table::new(headers, records))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes(rows: &[&[&str]], numbers: &[(u32, u16, f64)]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        for &(r, c, n) in numbers {
            sheet.write_number(r, c, n).unwrap();
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_text_cells_keep_leading_zeros() {
        let bytes = workbook_bytes(&[&["externalId", "name"], &["007", " Alice "], &["0042", ""]], &[]);
        assert!(is_xlsx(&bytes));

        let table = parse_xlsx_bytes(&bytes).unwrap();
        assert_eq!(table.columns, vec!["externalId", "name"]);
        assert_eq!(table.value(0, "externalId"), Some("007"));
        assert_eq!(table.value(0, "name"), Some("Alice"));
        assert_eq!(table.value(1, "externalId"), Some("0042"));
        assert_eq!(table.value(1, "name"), Some(""));
    }

    #[test]
    fn test_numeric_cells_as_strings() {
        let bytes = workbook_bytes(&[&["externalId", "itemsTaxRate"], &["1", ""]], &[(1, 1, 0.19), (2, 0, 5.0)]);

        let table = parse_xlsx_bytes(&bytes).unwrap();
        assert_eq!(table.value(0, "itemsTaxRate"), Some("0.19"));
        assert_eq!(table.value(1, "externalId"), Some("5"));
        assert_eq!(table.value(1, "itemsTaxRate"), Some(""));
    }

    #[test]
    fn test_blank_rows_skipped() {
        let bytes = workbook_bytes(&[&["externalId"], &["1"], &[""], &["2"]], &[]);
        let table = parse_xlsx_bytes(&bytes).unwrap();
        assert_eq!(table.column_values("externalId").unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_not_a_workbook() {
        assert!(!is_xlsx(b"externalId;name\n1;x"));
        let err = parse_xlsx_bytes(b"PK\x03\x04garbage").unwrap_err();
        assert!(matches!(err, CsvError::SpreadsheetError(_)));
    }
}
