//! Equivalence keys for the two duplicate rules.
//!
//! - [`Rule::Exact`]: every column except the identifier, raw (trimmed) values
//! - [`Rule::Core`]: the configured core fields, normalized per [`FieldType`]
//!
//! Building a [`KeyBuilder`] checks the table's columns first, so a
//! [`SchemaError`] is returned before any key is computed.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::models::{DedupConfig, FieldType, Record, Table};
use crate::normalize::FieldNormalizer;

/// Tuple of canonical values; equal keys mean duplicate rows.
pub type Key = Vec<String>;

/// Which equivalence rule a key follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    /// Rows equal in every column but the identifier. Duplicates are removed.
    Exact,
    /// Rows equal in their normalized core fields. Duplicates are only reported.
    Core,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Exact => f.write_str("exact"),
            Rule::Core => f.write_str("core"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum KeyColumn {
    Raw(usize),
    Normalized(usize, FieldType),
}

/// Derives the key of a record under one rule.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    rule: Rule,
    identifier: usize,
    columns: Vec<KeyColumn>,
    normalizer: FieldNormalizer,
}

impl KeyBuilder {
    /// Key over every column except `config.identifier_column`, in table order.
    pub fn exact(table: &Table, config: &DedupConfig) -> Result<Self, SchemaError> {
        check_columns(table, &[config.identifier_column.as_str()])?;
        let identifier = column_position(table, &config.identifier_column)?;

        let columns = (0..table.columns.len())
            .filter(|&i| i != identifier)
            .map(KeyColumn::Raw)
            .collect();

        Ok(Self {
            rule: Rule::Exact,
            identifier,
            columns,
            normalizer: FieldNormalizer::without_stop_words(),
        })
    }

    /// Key over the normalized core fields, in configured order.
    pub fn core(table: &Table, config: &DedupConfig) -> Result<Self, SchemaError> {
        check_columns(table, &config.core_rule_columns())?;
        let identifier = column_position(table, &config.identifier_column)?;

        let columns = config
            .core_fields
            .iter()
            .map(|field| {
                column_position(table, &field.name)
                    .map(|i| KeyColumn::Normalized(i, field.field_type))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rule: Rule::Core,
            identifier,
            columns,
            normalizer: FieldNormalizer::from_config(config),
        })
    }

    /// Builder for `rule`.
    pub fn for_rule(rule: Rule, table: &Table, config: &DedupConfig) -> Result<Self, SchemaError> {
        match rule {
            Rule::Exact => Self::exact(table, config),
            Rule::Core => Self::core(table, config),
        }
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    /// Position of the identifier column.
    pub fn identifier_index(&self) -> usize {
        self.identifier
    }

    /// Identifier cell of a record, as written in the input.
    pub fn identifier<'r>(&self, record: &'r Record) -> &'r str {
        record.get(self.identifier)
    }

    pub fn key(&self, record: &Record) -> Key {
        self.columns
            .iter()
            .map(|column| match *column {
                KeyColumn::Raw(i) => record.get(i).trim().to_string(),
                KeyColumn::Normalized(i, field_type) => {
                    self.normalizer.normalize(field_type, record.get(i))
                }
            })
            .collect()
    }
}

/// Fail with every absent column named, in the order requested.
pub fn check_columns(table: &Table, required: &[&str]) -> Result<(), SchemaError> {
    let mut missing: Vec<String> = Vec::new();
    for name in required {
        if !table.has_column(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

fn column_position(table: &Table, name: &str) -> Result<usize, SchemaError> {
    table
        .column_index(name)
        .ok_or_else(|| SchemaError::MissingColumns(vec![name.to_string()]))
}
