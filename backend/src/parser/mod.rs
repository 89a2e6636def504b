//! Table reader for delimited text and `.xlsx` workbooks.
//!
//! Delimited text gets encoding and delimiter auto-detection; workbooks are
//! recognized by their zip signature (or a `.xlsx`/`.xlsm` extension) and
//! read by [`xlsx`]. Both produce a [`Table`] of trimmed string cells.
//! Nothing is parsed as a number here, so identifiers like `007` survive
//! untouched.

pub mod xlsx;

use serde::Serialize;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Table;

pub use xlsx::{is_xlsx, parse_xlsx_bytes};

/// Kind of input a table was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Delimited,
    Xlsx,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Delimited => f.write_str("delimited text"),
            InputFormat::Xlsx => f.write_str("xlsx"),
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    pub format: InputFormat,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter; `None` for workbooks
    pub delimiter: Option<char>,
}

impl ParseResult {
    pub fn headers(&self) -> &[String] {
        &self.table.columns
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// A leading byte-order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.to_string(),
            None => String::from_utf8_lossy(bytes).to_string(),
        },
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse delimited text into a [`Table`].
///
/// The first record is the header row. Cells are trimmed, short rows are
/// padded with empty cells, extra cells are dropped and fully blank rows
/// are skipped.
///
/// # Example
/// ```ignore
/// use dupcheck::parse_table;
///
/// let table = parse_table("externalId;name\n007;Alice", ';').unwrap();
/// assert_eq!(table.value(0, "externalId"), Some("007"));
/// ```
pub fn parse_table(content: &str, delimiter: char) -> CsvResult<Table> {
    if !delimiter.is_ascii() {
        return Err(CsvError::ParseError {
            line: 1,
            message: format!("Delimiter '{}' is not a single-byte character", delimiter),
        });
    }

    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header_record = records
        .next()
        .ok_or(CsvError::EmptyFile)?
        .map_err(|e| to_parse_error(e, 1))?;

    let headers: Vec<String> = header_record.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| to_parse_error(e, idx + 2))?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(Table::new(headers, rows))
}

fn to_parse_error(err: csv::Error, fallback_line: usize) -> CsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    CsvError::ParseError {
        line,
        message: err.to_string(),
    }
}

/// Parse a file with auto-detection of format, encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_file_auto("/path/to/export.csv", None)?;
/// println!("Encoding: {}, Delimiter: {:?}", result.encoding, result.delimiter);
/// println!("Rows: {}", result.table.len());
/// ```
pub fn parse_file_auto<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;

    if has_workbook_extension(path) {
        return parse_workbook(&bytes);
    }
    parse_bytes_auto(&bytes, delimiter)
}

/// Parse bytes, detecting the format first. Delimited text also gets
/// encoding detection, and delimiter detection unless one is given.
pub fn parse_bytes_auto(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    if is_xlsx(bytes) {
        return parse_workbook(bytes);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let table = parse_table(&content, delimiter)?;

    Ok(ParseResult {
        table,
        format: InputFormat::Delimited,
        encoding,
        delimiter: Some(delimiter),
    })
}

fn parse_workbook(bytes: &[u8]) -> CsvResult<ParseResult> {
    Ok(ParseResult {
        table: parse_xlsx_bytes(bytes)?,
        format: InputFormat::Xlsx,
        encoding: "utf-8".to_string(),
        delimiter: None,
    })
}

fn has_workbook_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xlsm"))
}

/// Printable form of a delimiter.
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_table() {
        let table = parse_table("externalId;name\n007;Alice\n5;Bob", ';').unwrap();

        assert_eq!(table.columns, vec!["externalId", "name"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "externalId"), Some("007"));
        assert_eq!(table.value(1, "name"), Some("Bob"));
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name,value\n\"Smith, John\",\"Hello World\"";
        let table = parse_table(csv, ',').unwrap();

        assert_eq!(table.value(0, "name"), Some("Smith, John"));
        assert_eq!(table.value(0, "value"), Some("Hello World"));
    }

    #[test]
    fn test_cells_trimmed_and_blank_kept_empty() {
        let table = parse_table("a;b;c\n  1 ;;  3", ';').unwrap();

        assert_eq!(table.records[0].cells(), &["1", "", "3"]);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let table = parse_table("a;b\n1;2\n\n;\n3;4\n", ';').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ragged_rows() {
        let table = parse_table("a;b;c\n1\n1;2;3;4", ';').unwrap();

        assert_eq!(table.records[0].cells(), &["1", "", ""]);
        assert_eq!(table.records[1].cells(), &["1", "2", "3"]);
    }

    #[test]
    fn test_header_only_is_valid() {
        let table = parse_table("externalId;name\n", ';').unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn test_empty_input_error() {
        assert!(matches!(parse_table("", ';'), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b"", None), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "externalId,name\n007,Alice\n008,Bob";
        let result = parse_bytes_auto(csv.as_bytes(), None).unwrap();

        assert_eq!(result.format, InputFormat::Delimited);
        assert_eq!(result.delimiter, Some(','));
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.headers(), &["externalId", "name"]);
        assert_eq!(result.table.value(1, "externalId"), Some("008"));
    }

    #[test]
    fn test_delimiter_override() {
        let csv = "a;b,c\n1;2,3";
        let result = parse_bytes_auto(csv.as_bytes(), Some(',')).unwrap();
        assert_eq!(result.table.columns, vec!["a;b", "c"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_bom_dropped() {
        let bytes = "\u{feff}externalId;name\n1;x".as_bytes();
        let decoded = decode_content(bytes, "utf-8").unwrap();
        assert!(decoded.starts_with("externalId"));
    }

    #[test]
    fn test_parse_file_auto() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "externalId;code\n0042;X\n").unwrap();

        let result = parse_file_auto(file.path(), None).unwrap();
        assert_eq!(result.delimiter, Some(';'));
        assert_eq!(result.table.value(0, "externalId"), Some("0042"));
    }

    #[test]
    fn test_workbook_extension() {
        assert!(has_workbook_extension(Path::new("export.XLSX")));
        assert!(has_workbook_extension(Path::new("dir/export.xlsm")));
        assert!(!has_workbook_extension(Path::new("export.csv")));
        assert!(!has_workbook_extension(Path::new("xlsx")));
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "\\t");
        assert_eq!(format_delimiter(';'), ";");
    }
}
