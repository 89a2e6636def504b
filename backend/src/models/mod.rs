//! Domain models for the duplicate-check pipeline.
//!
//! - [`Table`] / [`Record`] - Tabular input of opaque string cells
//! - [`FieldType`] - Semantic type that selects a normalization rule
//! - [`CoreField`] - A column participating in the core (Rule B) key
//! - [`DedupConfig`] - Identifier column, core fields and stop words

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::validate_config;

// =============================================================================
// Table
// =============================================================================

/// One row of a [`Table`], cells aligned with [`Table::columns`].
///
/// Cells are never parsed: `"007"` stays `"007"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    cells: Vec<String>,
}

impl Record {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell at a column position, `""` when out of range.
    pub fn get(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// An ordered sequence of records sharing one column set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    #[serde(rename = "rows")]
    pub records: Vec<Record>,
}

impl Table {
    /// Build a table, trimming every cell and aligning rows to the header width.
    ///
    /// Short rows are padded with empty cells, extra cells are dropped.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let records = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<String> = row
                    .into_iter()
                    .take(width)
                    .map(|c| c.trim().to_string())
                    .collect();
                cells.resize(width, String::new());
                Record::new(cells)
            })
            .collect();

        Self {
            columns: columns.into_iter().map(|c| c.trim().to_string()).collect(),
            records,
        }
    }

    /// Convenience constructor for literal rows.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Position of a column by exact name (first match).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cell value by row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.records.get(row).map(|r| r.get(col))
    }

    /// A new table with the same columns holding the rows at `positions`, in that order.
    pub fn select(&self, positions: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            records: positions
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
        }
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let col = self.column_index(column)?;
        Some(self.records.iter().map(|r| r.get(col)).collect())
    }
}

// =============================================================================
// Field Types
// =============================================================================

/// Semantic type of a core field; selects the normalization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Yes/no flag (`true`, `1`, `wahr`...).
    Boolean,
    /// Percentage or fraction (`8,1%`, `0.081`).
    Rate,
    /// Free-text name with stop words and punctuation removed.
    Name,
    /// Country/category-like text.
    Text,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Rate => "rate",
            FieldType::Name => "name",
            FieldType::Text => "text",
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "rate" => Ok(FieldType::Rate),
            "name" => Ok(FieldType::Name),
            "text" => Ok(FieldType::Text),
            other => Err(format!(
                "Unknown field type '{}' (expected boolean, rate, name or text)",
                other
            )),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column participating in the core key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl CoreField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Default identifier column.
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "externalId";

/// Service-related words dropped from names before comparison.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "service",
    "services",
    "servicegebühr",
    "servicegebühren",
    "dienstleistung",
    "dienstleistungen",
    "leistung",
    "leistungen",
    "gebühr",
    "gebühren",
    "fee",
    "fees",
];

/// Rule set for both duplicate rules.
///
/// The exact rule only uses `identifier_column`; the core rule also uses
/// `core_fields` (in order) and `stop_words`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupConfig {
    pub identifier_column: String,
    pub core_fields: Vec<CoreField>,
    #[serde(default)]
    pub stop_words: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            identifier_column: DEFAULT_IDENTIFIER_COLUMN.to_string(),
            core_fields: vec![
                CoreField::new("taxExemption", FieldType::Boolean),
                CoreField::new("name", FieldType::Name),
                CoreField::new("recipientCountry", FieldType::Text),
                CoreField::new("category", FieldType::Text),
                CoreField::new("vendorCountry", FieldType::Text),
                CoreField::new("itemsTaxRate", FieldType::Rate),
            ],
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl DedupConfig {
    /// Parse, schema-check and sanity-check a JSON config.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        validate_config(&value).map_err(|errors| ConfigError::SchemaViolation { errors })?;

        let config: DedupConfig = serde_json::from_value(value)?;
        config.check()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Semantic checks the schema cannot express.
    pub fn check(&self) -> ConfigResult<()> {
        if self.identifier_column.trim().is_empty() {
            return Err(ConfigError::Invalid("identifierColumn must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.core_fields {
            if field.name == self.identifier_column {
                return Err(ConfigError::Invalid(format!(
                    "core field '{}' is the identifier column",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "core field '{}' listed twice",
                    field.name
                )));
            }
        }

        Ok(())
    }

    /// Columns the core rule needs: identifier first, then core fields.
    pub fn core_rule_columns(&self) -> Vec<&str> {
        std::iter::once(self.identifier_column.as_str())
            .chain(self.core_fields.iter().map(|f| f.name.as_str()))
            .collect()
    }
}
