//! Survivor selection for exact-rule duplicate groups.
//!
//! Rows are ordered by `(group key, identifier rank, input position)`.
//! The identifier rank is numeric when the identifier parses as a number
//! and textual otherwise, numeric ranks first:
//!
//! ```text
//! {"007", "10", "2"}  -> 2 < 7 < 10        survivor "2"
//! {"b", "a", "c"}     -> "a" < "b" < "c"   survivor "a"
//! {"005", "5"}        -> 5 == 5, earlier row wins
//! ```
//!
//! Input position is part of the key, so the outcome never depends on sort
//! stability. Identifiers are reported exactly as written.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::grouper::Grouping;
use super::keys::Key;
use crate::models::Table;

/// Exact decimal value of a numeric identifier.
///
/// Digits are kept as text so long identifiers compare without rounding:
/// leading integer zeros and trailing fraction zeros are dropped, which makes
/// `005`, `5` and `5.0` the same number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactNumber {
    negative: bool,
    integer: String,
    fraction: String,
}

impl ExactNumber {
    /// Plain decimal notation is read digit by digit. Other finite float
    /// spellings (`1e3`) go through `f64` and its shortest decimal form.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::parse_plain(trimmed).or_else(|| match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::parse_plain(&value.to_string()),
            _ => None,
        })
    }

    fn parse_plain(s: &str) -> Option<Self> {
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (integer.is_empty() && fraction.is_empty()) || !all_digits(integer) || !all_digits(fraction) {
            return None;
        }

        let integer = integer.trim_start_matches('0').to_string();
        let fraction = fraction.trim_end_matches('0').to_string();
        let is_zero = integer.is_empty() && fraction.is_empty();

        Some(Self { negative: negative && !is_zero, integer, fraction })
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.integer
            .len()
            .cmp(&other.integer.len())
            .then_with(|| self.integer.cmp(&other.integer))
            .then_with(|| self.fraction.cmp(&other.fraction))
    }
}

impl Ord for ExactNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => self.cmp_magnitude(other).reverse(),
        }
    }
}

impl PartialOrd for ExactNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort rank of an identifier. Numeric ranks come first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdentifierRank {
    Numeric(ExactNumber),
    /// Unparsable identifiers, after every numeric one.
    Text(String),
}

impl IdentifierRank {
    pub fn of(identifier: &str) -> Self {
        match ExactNumber::parse(identifier) {
            Some(number) => IdentifierRank::Numeric(number),
            None => IdentifierRank::Text(identifier.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, IdentifierRank::Numeric(_))
    }
}

/// Full ordering key of a row.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RowOrder<'a> {
    key: &'a Key,
    rank: &'a IdentifierRank,
    position: usize,
}

/// Result of selecting one survivor per group.
#[derive(Debug, Clone, Default)]
pub struct Canonicalization {
    /// Kept rows (survivors and unique rows), in input order.
    pub survivors: Vec<usize>,
    /// One survivor per duplicate group, in group order.
    pub group_survivors: Vec<usize>,
    /// Dropped rows, in display order.
    pub removed: Vec<usize>,
    /// Identifiers of dropped rows, each listed once, in display order.
    pub removed_ids: Vec<String>,
    /// Every duplicate row, sorted for display.
    pub display_order: Vec<usize>,
}

/// Rank every row's identifier.
pub fn identifier_ranks(table: &Table, identifier: usize) -> Vec<IdentifierRank> {
    table
        .records
        .iter()
        .map(|r| IdentifierRank::of(r.get(identifier)))
        .collect()
}

/// Flagged rows sorted by `(key, identifier rank, position)`.
pub fn display_order(grouping: &Grouping, ranks: &[IdentifierRank]) -> Vec<usize> {
    let mut rows = grouping.flagged_rows();
    rows.sort_by(|&a, &b| row_order(grouping, ranks, a).cmp(&row_order(grouping, ranks, b)));
    rows
}

fn row_order<'a>(grouping: &'a Grouping, ranks: &'a [IdentifierRank], row: usize) -> RowOrder<'a> {
    RowOrder {
        key: &grouping.keys[row],
        rank: &ranks[row],
        position: row,
    }
}

/// Keep the lowest-ranked row of each group, drop the rest.
pub fn canonicalize(table: &Table, identifier: usize, grouping: &Grouping) -> Canonicalization {
    let ranks = identifier_ranks(table, identifier);
    let display = display_order(grouping, &ranks);

    let mut dropped = vec![false; table.len()];
    let mut group_survivors = Vec::with_capacity(grouping.groups.len());

    for group in &grouping.groups {
        let survivor = group
            .rows
            .iter()
            .copied()
            .min_by(|&a, &b| ranks[a].cmp(&ranks[b]).then(a.cmp(&b)));

        if let Some(survivor) = survivor {
            group_survivors.push(survivor);
            for &row in group.rows.iter().filter(|&&r| r != survivor) {
                dropped[row] = true;
            }
        }
    }

    let survivors = (0..table.len()).filter(|&i| !dropped[i]).collect();
    let removed: Vec<usize> = display.iter().copied().filter(|&i| dropped[i]).collect();

    let mut seen = HashSet::new();
    let removed_ids = removed
        .iter()
        .map(|&i| table.records[i].get(identifier).to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    Canonicalization {
        survivors,
        group_survivors,
        removed,
        removed_ids,
        display_order: display,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::grouper::group_rows;
    use crate::models::Record;

    /// Column 0 is the identifier, the rest is the key.
    fn run(rows: &[&[&str]]) -> (Table, Canonicalization) {
        let width = rows.first().map(|r| r.len()).unwrap_or(1);
        let columns: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
        let table = Table::new(
            columns,
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        );
        let grouping = group_rows(&table.records, |r: &Record| r.cells()[1..].to_vec());
        let canon = canonicalize(&table, 0, &grouping);
        (table, canon)
    }

    fn survivor_ids(table: &Table, canon: &Canonicalization) -> Vec<String> {
        canon
            .group_survivors
            .iter()
            .map(|&i| table.records[i].get(0).to_string())
            .collect()
    }

    #[test]
    fn test_rank_ordering() {
        assert!(IdentifierRank::of("2") < IdentifierRank::of("007"));
        assert!(IdentifierRank::of("007") < IdentifierRank::of("10"));
        assert!(IdentifierRank::of("10") < IdentifierRank::of("a"));
        assert!(IdentifierRank::of("a") < IdentifierRank::of("b"));
        assert_eq!(IdentifierRank::of("005"), IdentifierRank::of("5"));
        assert!(!IdentifierRank::of("NaN").is_numeric());
        assert!(!IdentifierRank::of("").is_numeric());
    }

    #[test]
    fn test_exact_number_ordering() {
        assert!(IdentifierRank::of("-3") < IdentifierRank::of("-2.5"));
        assert!(IdentifierRank::of("-0.5") < IdentifierRank::of("0"));
        assert_eq!(IdentifierRank::of("-0"), IdentifierRank::of("0.000"));
        assert!(IdentifierRank::of("0.25") < IdentifierRank::of(".5"));
        assert_eq!(IdentifierRank::of("5.10"), IdentifierRank::of("05.1"));
        assert_eq!(IdentifierRank::of("1e3"), IdentifierRank::of("1000"));
        assert!(IdentifierRank::of("999") < IdentifierRank::of("1000"));
        assert!(!IdentifierRank::of("inf").is_numeric());
        assert!(!IdentifierRank::of("1-2").is_numeric());
    }

    #[test]
    fn test_long_identifiers_compare_exactly() {
        assert!(IdentifierRank::of("9007199254740992") < IdentifierRank::of("9007199254740993"));
        assert!(IdentifierRank::of("100000000000000000") < IdentifierRank::of("100000000000000001"));
        assert_eq!(
            IdentifierRank::of("000100000000000000001"),
            IdentifierRank::of("100000000000000001")
        );
    }

    #[test]
    fn test_long_identifier_survivor() {
        let (table, canon) = run(&[&["9007199254740993", "x"], &["9007199254740992", "x"]]);
        assert_eq!(survivor_ids(&table, &canon), vec!["9007199254740992"]);

        let (table, canon) = run(&[&["100000000000000001", "x"], &["100000000000000000", "x"]]);
        assert_eq!(survivor_ids(&table, &canon), vec!["100000000000000000"]);
        assert_eq!(canon.removed_ids, vec!["100000000000000001"]);
    }

    #[test]
    fn test_numeric_aware_survivor() {
        let (table, canon) = run(&[&["007", "x"], &["10", "x"], &["2", "x"]]);
        assert_eq!(survivor_ids(&table, &canon), vec!["2"]);
        assert_eq!(canon.removed_ids, vec!["007", "10"]);
    }

    #[test]
    fn test_lexicographic_fallback() {
        let (table, canon) = run(&[&["b", "x"], &["a", "x"], &["c", "x"]]);
        assert_eq!(survivor_ids(&table, &canon), vec!["a"]);
    }

    #[test]
    fn test_numeric_before_text() {
        let (table, canon) = run(&[&["abc", "x"], &["99", "x"]]);
        assert_eq!(survivor_ids(&table, &canon), vec!["99"]);
    }

    #[test]
    fn test_numeric_tie_keeps_earliest_row() {
        let (table, canon) = run(&[&["5", "x"], &["005", "x"], &["9", "y"]]);
        assert_eq!(survivor_ids(&table, &canon), vec!["5"]);

        let (table, canon) = run(&[&["005", "x"], &["5", "x"], &["9", "y"]]);
        assert_eq!(survivor_ids(&table, &canon), vec!["005"]);
        assert_eq!(canon.survivors, vec![0, 2]);
    }

    #[test]
    fn test_identical_identifiers_keep_earliest_row() {
        let (_, canon) = run(&[&["1", "y"], &["7", "x"], &["7", "x"]]);
        assert_eq!(canon.group_survivors, vec![1]);
        assert_eq!(canon.removed, vec![2]);
        assert_eq!(canon.removed_ids, vec!["7"]);
    }

    #[test]
    fn test_removed_ids_deduplicated() {
        let (_, canon) = run(&[&["1", "x"], &["3", "x"], &["3", "x"]]);
        assert_eq!(canon.removed, vec![1, 2]);
        assert_eq!(canon.removed_ids, vec!["3"]);
    }

    #[test]
    fn test_display_order_by_key_then_rank() {
        let (_, canon) = run(&[&["9", "b"], &["3", "a"], &["1", "b"], &["2", "a"], &["5", "c"]]);
        assert_eq!(canon.display_order, vec![3, 1, 2, 0]);
        assert_eq!(canon.survivors, vec![2, 3, 4]);
    }

    #[test]
    fn test_no_groups_keeps_everything() {
        let (_, canon) = run(&[&["1", "a"], &["2", "b"]]);
        assert_eq!(canon.survivors, vec![0, 1]);
        assert!(canon.removed.is_empty());
        assert!(canon.removed_ids.is_empty());
    }
}
