//! # Dupcheck - duplicate detection for transaction spreadsheets
//!
//! Dupcheck finds duplicate rows in a tabular export with two rules and
//! produces a cleaned table plus identifier reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│    Dedup    │────▶│   Reports   │
//! │ (ISO/UTF8)  │     │ (auto-enc)  │     │ (rule A/B)  │     │ (CSV/JSON)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! - **Rule A (exact)**: rows equal on every column except the identifier.
//!   One survivor per group, the lowest identifier (numbers before text).
//! - **Rule B (core)**: rows equal on normalized core fields. Every member
//!   is reported, nothing is removed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dupcheck::{dedupe_file, DedupOptions};
//! use std::path::Path;
//!
//! let run = dedupe_file(Path::new("export.csv"), &DedupOptions::default())?;
//! println!("{} columns", run.table_info.columns.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Table, records and rule configuration
//! - [`parser`] - CSV and XLSX parsing with auto-detection
//! - [`normalize`] - Per-type field canonicalization
//! - [`dedup`] - Keys, grouping, survivors and reports
//! - [`export`] - CSV and XLSX artifacts
//! - [`validation`] - Config schema validation
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Duplicate detection
pub mod dedup;
pub mod normalize;

// Output
pub mod export;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    CsvError,
    ExportError,
    PipelineError,
    SchemaError,
    ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CoreField,
    DedupConfig,
    FieldType,
    Record,
    Table,
    DEFAULT_IDENTIFIER_COLUMN,
    DEFAULT_STOP_WORDS,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    format_delimiter,
    is_xlsx,
    parse_bytes_auto,
    parse_file_auto,
    parse_table,
    parse_xlsx_bytes,
    InputFormat,
    ParseResult,
};

// =============================================================================
// Re-exports - Normalization
// =============================================================================

pub use normalize::{normalize, FieldNormalizer};

// =============================================================================
// Re-exports - Dedup
// =============================================================================

pub use dedup::{
    canonicalize,
    check_columns,
    dedupe_bytes,
    dedupe_file,
    dedupe_table,
    group_rows,
    CoreOutcome,
    CoreReport,
    DedupOptions,
    DedupOutcome,
    DedupRun,
    ExactOutcome,
    ExactNumber,
    ExactReport,
    IdentifierRank,
    Key,
    KeyBuilder,
    Rule,
    RuleSelection,
    TableInfo,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{
    export_outcome,
    table_to_csv_string,
    table_to_xlsx_bytes,
    write_identifiers,
    write_table,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid_config, validate_config};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, CheckResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
