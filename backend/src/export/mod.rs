//! Writers for the output artifacts.
//!
//! | File                     | Content                                   |
//! |--------------------------|-------------------------------------------|
//! | `cleaned.csv`            | Exact-rule survivors, input columns       |
//! | `cleaned.xlsx`           | Same table as a workbook                  |
//! | `removed_ids.csv`        | Identifiers removed by the exact rule     |
//! | `core_duplicate_ids.csv` | Identifiers of every core-rule duplicate  |
//!
//! Files are written with their header row even when there is nothing else
//! to write.

pub mod xlsx;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::dedup::DedupOutcome;
use crate::error::ExportResult;
use crate::models::Table;

pub use xlsx::table_to_xlsx_bytes;

pub const CLEANED_FILE: &str = "cleaned.csv";
pub const CLEANED_XLSX_FILE: &str = "cleaned.xlsx";
pub const REMOVED_IDS_FILE: &str = "removed_ids.csv";
pub const CORE_DUPLICATE_IDS_FILE: &str = "core_duplicate_ids.csv";

/// Write a table with its header row.
pub fn write_table<W: Write>(table: &Table, writer: W) -> ExportResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&table.columns)?;
    for record in &table.records {
        csv.write_record(record.cells())?;
    }
    csv.flush()?;
    Ok(())
}

/// Write a single-column table of identifiers.
pub fn write_identifiers<W: Write>(header: &str, ids: &[String], writer: W) -> ExportResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([header])?;
    for id in ids {
        csv.write_record([id])?;
    }
    csv.flush()?;
    Ok(())
}

/// Table as CSV text.
pub fn table_to_csv_string(table: &Table) -> ExportResult<String> {
    let mut buffer = Vec::new();
    write_table(table, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write every artifact the outcome holds into `dir`; returns the paths written.
pub fn export_outcome(
    outcome: &DedupOutcome,
    identifier_column: &str,
    dir: &Path,
) -> ExportResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if let Some(exact) = &outcome.exact {
        let path = dir.join(CLEANED_FILE);
        write_table(&exact.cleaned, fs::File::create(&path)?)?;
        written.push(path);

        let path = dir.join(CLEANED_XLSX_FILE);
        fs::write(&path, table_to_xlsx_bytes(&exact.cleaned)?)?;
        written.push(path);

        let path = dir.join(REMOVED_IDS_FILE);
        write_identifiers(identifier_column, &exact.report.removed_ids, fs::File::create(&path)?)?;
        written.push(path);
    }

    if let Some(core) = &outcome.core {
        let path = dir.join(CORE_DUPLICATE_IDS_FILE);
        write_identifiers(identifier_column, &core.report.duplicate_ids, fs::File::create(&path)?)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::{dedupe_table, DedupOptions, RuleSelection};
    use tempfile::tempdir;

    #[test]
    fn test_write_table_quotes_and_keeps_zeros() {
        let table = Table::from_rows(&["externalId", "name"], &[&["007", "Smith, John"]]);
        let csv = table_to_csv_string(&table).unwrap();
        assert_eq!(csv, "externalId,name\n007,\"Smith, John\"\n");
    }

    #[test]
    fn test_empty_identifier_list_has_header() {
        let mut buffer = Vec::new();
        write_identifiers("externalId", &[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "externalId\n");
    }

    #[test]
    fn test_export_outcome_files() {
        let table = Table::from_rows(
            &["externalId", "amount"],
            &[&["001", "5"], &["002", "5"], &["003", "7"]],
        );
        let options = DedupOptions { rules: RuleSelection::Exact, ..Default::default() };
        let outcome = dedupe_table(&table, &options).unwrap();

        let dir = tempdir().unwrap();
        let written = export_outcome(&outcome, "externalId", dir.path()).unwrap();
        assert_eq!(written.len(), 3);

        let cleaned = fs::read_to_string(dir.path().join(CLEANED_FILE)).unwrap();
        assert_eq!(cleaned, "externalId,amount\n001,5\n003,7\n");

        let removed = fs::read_to_string(dir.path().join(REMOVED_IDS_FILE)).unwrap();
        assert_eq!(removed, "externalId\n002\n");

        let workbook = fs::read(dir.path().join(CLEANED_XLSX_FILE)).unwrap();
        let cleaned = crate::parser::parse_xlsx_bytes(&workbook).unwrap();
        assert_eq!(cleaned.column_values("externalId").unwrap(), vec!["001", "003"]);

        assert!(!dir.path().join(CORE_DUPLICATE_IDS_FILE).exists());
    }
}
