//! Error types for the duplicate-check pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - Reading and decoding delimited text
//! - [`SchemaError`] - Required columns absent from the input table
//! - [`ConfigError`] - Loading and checking rule configuration
//! - [`ExportError`] - Writing output artifacts
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading a delimited file or workbook.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode content.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Unreadable `.xlsx` workbook.
    #[error("Failed to read spreadsheet: {0}")]
    SpreadsheetError(String),

    /// Malformed delimited text.
    #[error("Line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The input table lacks columns a rule needs.
///
/// Raised before any normalization or grouping work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl SchemaError {
    /// Names of the columns that were not found.
    pub fn missing_columns(&self) -> &[String] {
        match self {
            SchemaError::MissingColumns(cols) => cols,
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading a rule configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Config is not valid JSON or does not match the expected shape.
    #[error("Config JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Config violates the embedded schema.
    #[error("Config does not match schema: {}", .errors.join("; "))]
    SchemaViolation { errors: Vec<String> },

    /// Config is well-formed but contradictory.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing output artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV writer error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("XLSX writer error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::dedup::pipeline::dedupe_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Required columns missing.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
