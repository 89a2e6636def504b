//! Summary counts and identifier lists for both rules.
//!
//! A report with zero groups is a normal, successful result: check
//! [`ExactReport::is_clean`] / [`CoreReport::is_clean`] rather than treating
//! an empty list as missing output.

use serde::Serialize;

use super::canonical::Canonicalization;
use super::grouper::Grouping;
use crate::models::Table;

/// Exact-rule outcome in numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactReport {
    pub input_rows: usize,
    pub survivor_rows: usize,
    /// `input_rows - survivor_rows`
    pub removed_count: usize,
    pub group_count: usize,
    /// Rows belonging to any duplicate group, survivors included.
    pub duplicate_rows: usize,
    /// Identifiers of removed rows, each once.
    pub removed_ids: Vec<String>,
}

impl ExactReport {
    pub fn assemble(table: &Table, grouping: &Grouping, canon: &Canonicalization) -> Self {
        let input_rows = table.len();
        let survivor_rows = canon.survivors.len();

        Self {
            input_rows,
            survivor_rows,
            removed_count: input_rows - survivor_rows,
            group_count: grouping.group_count(),
            duplicate_rows: grouping.flagged_count(),
            removed_ids: canon.removed_ids.clone(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.group_count == 0
    }

    pub fn summary(&self) -> String {
        if self.is_clean() {
            "No duplicates found.".to_string()
        } else {
            format!(
                "{} row(s) removed in {} duplicate group(s).",
                self.removed_count, self.group_count
            )
        }
    }
}

/// One core-rule duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Normalized key shared by the members.
    pub key: Vec<String>,
    /// Member identifiers, in input order.
    pub identifiers: Vec<String>,
    pub size: usize,
}

/// Core-rule outcome in numbers. Nothing is removed under this rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreReport {
    pub input_rows: usize,
    pub group_count: usize,
    /// Sum of group sizes.
    pub flagged_count: usize,
    /// One identifier per flagged row, in display order.
    pub duplicate_ids: Vec<String>,
    pub groups: Vec<GroupSummary>,
}

impl CoreReport {
    /// `display_order` lists the flagged rows in presentation order.
    pub fn assemble(
        table: &Table,
        identifier: usize,
        grouping: &Grouping,
        display_order: &[usize],
    ) -> Self {
        let id_of = |row: usize| table.records[row].get(identifier).to_string();

        let groups = grouping
            .groups
            .iter()
            .map(|group| GroupSummary {
                key: group.key.clone(),
                identifiers: group.rows.iter().map(|&r| id_of(r)).collect(),
                size: group.len(),
            })
            .collect();

        Self {
            input_rows: table.len(),
            group_count: grouping.group_count(),
            flagged_count: grouping.flagged_count(),
            duplicate_ids: display_order.iter().map(|&r| id_of(r)).collect(),
            groups,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.group_count == 0
    }

    pub fn summary(&self) -> String {
        if self.is_clean() {
            "No core-field duplicates found.".to_string()
        } else {
            format!(
                "{} row(s) flagged in {} core-field duplicate group(s).",
                self.flagged_count, self.group_count
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::canonical::{canonicalize, display_order, identifier_ranks};
    use crate::dedup::grouper::group_rows;
    use crate::models::Record;

    fn table() -> Table {
        Table::from_rows(
            &["id", "v"],
            &[&["3", "a"], &["1", "a"], &["2", "b"], &["4", "a"], &["5", "c"]],
        )
    }

    fn by_value(r: &Record) -> Vec<String> {
        vec![r.get(1).to_string()]
    }

    #[test]
    fn test_exact_report_counts() {
        let table = table();
        let grouping = group_rows(&table.records, by_value);
        let canon = canonicalize(&table, 0, &grouping);
        let report = ExactReport::assemble(&table, &grouping, &canon);

        assert_eq!(report.input_rows, 5);
        assert_eq!(report.survivor_rows, 3);
        assert_eq!(report.removed_count, 2);
        assert_eq!(report.group_count, 1);
        assert_eq!(report.duplicate_rows, 3);
        assert_eq!(report.removed_ids, vec!["3", "4"]);
        assert_eq!(report.summary(), "2 row(s) removed in 1 duplicate group(s).");
    }

    #[test]
    fn test_core_report_keeps_every_member() {
        let table = table();
        let grouping = group_rows(&table.records, by_value);
        let ranks = identifier_ranks(&table, 0);
        let order = display_order(&grouping, &ranks);
        let report = CoreReport::assemble(&table, 0, &grouping, &order);

        assert_eq!(report.flagged_count, 3);
        assert_eq!(report.duplicate_ids, vec!["1", "3", "4"]);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].identifiers, vec!["3", "1", "4"]);
        let total: usize = report.groups.iter().map(|g| g.size).sum();
        assert_eq!(total, report.flagged_count);
    }

    #[test]
    fn test_clean_reports() {
        let table = Table::from_rows(&["id", "v"], &[&["1", "a"], &["2", "b"]]);
        let grouping = group_rows(&table.records, by_value);
        let canon = canonicalize(&table, 0, &grouping);

        let exact = ExactReport::assemble(&table, &grouping, &canon);
        assert!(exact.is_clean());
        assert_eq!(exact.removed_count, 0);
        assert_eq!(exact.summary(), "No duplicates found.");

        let core = CoreReport::assemble(&table, 0, &grouping, &[]);
        assert!(core.is_clean());
        assert!(core.duplicate_ids.is_empty());
    }

    #[test]
    fn test_report_json_is_camel_case() {
        let table = Table::from_rows(&["id", "v"], &[]);
        let grouping = group_rows(&table.records, by_value);
        let canon = canonicalize(&table, 0, &grouping);
        let json = serde_json::to_value(ExactReport::assemble(&table, &grouping, &canon)).unwrap();

        assert_eq!(json["removedCount"], 0);
        assert_eq!(json["groupCount"], 0);
        assert!(json["removedIds"].as_array().unwrap().is_empty());
    }
}
