//! High-level pipeline: schema check, keys, grouping, survivors, reports.
//!
//! # Example
//!
//! ```rust,ignore
//! use dupcheck::{dedupe_file, DedupOptions};
//! use std::path::Path;
//!
//! let run = dedupe_file(Path::new("export.csv"), &DedupOptions::default())?;
//! if let Some(exact) = &run.outcome.exact {
//!     println!("{}", exact.report.summary());
//! }
//! ```
//!
//! Every selected rule's columns are checked before any key is computed, so
//! a missing column aborts the run with nothing produced.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::canonical::{canonicalize, display_order, identifier_ranks};
use super::grouper::group_rows;
use super::keys::{check_columns, KeyBuilder, Rule};
use super::report::{CoreReport, ExactReport};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineResult, SchemaError};
use crate::models::{DedupConfig, Table};
use crate::parser::{format_delimiter, parse_bytes_auto, parse_file_auto, InputFormat, ParseResult};

/// Which rules a run applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSelection {
    Exact,
    Core,
    #[default]
    Both,
}

impl RuleSelection {
    pub fn rules(&self) -> Vec<Rule> {
        match self {
            RuleSelection::Exact => vec![Rule::Exact],
            RuleSelection::Core => vec![Rule::Core],
            RuleSelection::Both => vec![Rule::Exact, Rule::Core],
        }
    }

    pub fn includes(&self, rule: Rule) -> bool {
        self.rules().contains(&rule)
    }
}

impl std::str::FromStr for RuleSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "a" => Ok(RuleSelection::Exact),
            "core" | "b" => Ok(RuleSelection::Core),
            "both" | "all" | "" => Ok(RuleSelection::Both),
            other => Err(format!("Unknown rule '{}' (expected exact, core or both)", other)),
        }
    }
}

/// Options for a run.
#[derive(Debug, Clone, Default)]
pub struct DedupOptions {
    pub config: DedupConfig,
    pub rules: RuleSelection,
    /// Delimiter override; auto-detected when `None`.
    pub delimiter: Option<char>,
}

/// Exact-rule results.
#[derive(Debug, Clone)]
pub struct ExactOutcome {
    /// One row per group plus every unique row, in input order.
    pub cleaned: Table,
    /// All rows of duplicate groups, in display order.
    pub duplicates: Table,
    /// Duplicate membership per input row.
    pub flags: Vec<bool>,
    pub report: ExactReport,
}

/// Core-rule results. No row is removed.
#[derive(Debug, Clone)]
pub struct CoreOutcome {
    /// All rows of duplicate groups, in display order.
    pub flagged: Table,
    /// Duplicate membership per input row.
    pub flags: Vec<bool>,
    pub report: CoreReport,
}

/// Results of the selected rules.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub exact: Option<ExactOutcome>,
    pub core: Option<CoreOutcome>,
}

impl DedupOutcome {
    /// True when no selected rule found a duplicate group.
    pub fn is_clean(&self) -> bool {
        self.exact.as_ref().map_or(true, |e| e.report.is_clean())
            && self.core.as_ref().map_or(true, |c| c.report.is_clean())
    }
}

/// Input file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub format: InputFormat,
    pub encoding: String,
    pub delimiter: Option<char>,
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// A parsed input plus its outcome.
#[derive(Debug, Clone)]
pub struct DedupRun {
    pub table_info: TableInfo,
    pub outcome: DedupOutcome,
}

/// Columns the selected rules need, identifier first.
pub fn required_columns(options: &DedupOptions) -> Vec<&str> {
    if options.rules.includes(Rule::Core) {
        options.config.core_rule_columns()
    } else {
        vec![options.config.identifier_column.as_str()]
    }
}

/// Run the selected rules on an in-memory table.
pub fn dedupe_table(table: &Table, options: &DedupOptions) -> Result<DedupOutcome, SchemaError> {
    check_columns(table, &required_columns(options))?;

    let builders = options
        .rules
        .rules()
        .into_iter()
        .map(|rule| KeyBuilder::for_rule(rule, table, &options.config))
        .collect::<Result<Vec<_>, _>>()?;

    let mut outcome = DedupOutcome::default();
    for builder in &builders {
        match builder.rule() {
            Rule::Exact => outcome.exact = Some(run_exact(table, builder)),
            Rule::Core => outcome.core = Some(run_core(table, builder)),
        }
    }

    Ok(outcome)
}

/// Exact rule: group on every non-identifier column and keep one row per group.
pub fn run_exact(table: &Table, builder: &KeyBuilder) -> ExactOutcome {
    log_info("🔍 Exact rule: comparing all columns except the identifier...");
    let grouping = group_rows(&table.records, |r| builder.key(r));
    let canon = canonicalize(table, builder.identifier_index(), &grouping);
    let report = ExactReport::assemble(table, &grouping, &canon);

    if report.is_clean() {
        log_success(report.summary());
    } else {
        log_warning(report.summary());
    }

    ExactOutcome {
        cleaned: table.select(&canon.survivors),
        duplicates: table.select(&canon.display_order),
        flags: grouping.flags,
        report,
    }
}

/// Core rule: group on normalized core fields and flag every member.
pub fn run_core(table: &Table, builder: &KeyBuilder) -> CoreOutcome {
    log_info("🔍 Core rule: comparing normalized core fields...");
    let grouping = group_rows(&table.records, |r| builder.key(r));
    let ranks = identifier_ranks(table, builder.identifier_index());
    let order = display_order(&grouping, &ranks);
    let report = CoreReport::assemble(table, builder.identifier_index(), &grouping, &order);

    if report.is_clean() {
        log_success(report.summary());
    } else {
        log_warning(report.summary());
    }

    CoreOutcome {
        flagged: table.select(&order),
        flags: grouping.flags,
        report,
    }
}

/// Parse a file and run the selected rules.
pub fn dedupe_file(path: &Path, options: &DedupOptions) -> PipelineResult<DedupRun> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_file_auto(path, options.delimiter)?;
    dedupe_parsed(parsed, options)
}

/// Same as [`dedupe_file`] for an uploaded buffer.
pub fn dedupe_bytes(bytes: &[u8], options: &DedupOptions) -> PipelineResult<DedupRun> {
    log_info(format!("📖 Reading upload ({} bytes)...", bytes.len()));
    let parsed = parse_bytes_auto(bytes, options.delimiter)?;
    dedupe_parsed(parsed, options)
}

fn dedupe_parsed(parsed: ParseResult, options: &DedupOptions) -> PipelineResult<DedupRun> {
    log_success(format!("Detected format: {}", parsed.format));
    if let Some(delimiter) = parsed.delimiter {
        log_success(format!("Detected encoding: {}", parsed.encoding));
        log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }
    log_success(format!("Read {} rows", parsed.table.len()));
    log_info(format!("📋 {} columns", parsed.table.columns.len()));
    log_info_indent(parsed.table.columns.join(", "), 1);

    let outcome = dedupe_table(&parsed.table, options)?;

    Ok(DedupRun {
        table_info: TableInfo {
            format: parsed.format,
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            columns: parsed.table.columns,
            row_count: parsed.table.records.len(),
        },
        outcome,
    })
}
