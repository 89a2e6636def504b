//! Partition rows into equivalence classes by key.
//!
//! ```text
//! row  key            flag
//! 0    [A, DE, 19%]   true   ┐ group 0
//! 1    [B, AT, 10%]   false  │
//! 2    [A, DE, 19%]   true   ┘
//! ```
//!
//! Keys are compared by exact equality. Rows whose key fields are all empty
//! share the empty key and group together like any other value.

use serde::Serialize;
use std::collections::HashMap;

use super::keys::Key;
use crate::models::Record;

/// A key shared by two or more rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub key: Key,
    /// Member positions, in input order.
    pub rows: Vec<usize>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keys, duplicate flags and duplicate groups of one table.
#[derive(Debug, Clone)]
pub struct Grouping {
    /// Key per row, aligned with the input.
    pub keys: Vec<Key>,
    /// True iff the row's key occurs at least twice.
    pub flags: Vec<bool>,
    /// Classes of size >= 2, ordered by first appearance.
    pub groups: Vec<DuplicateGroup>,
}

impl Grouping {
    /// Number of distinct keys occurring at least twice.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of rows belonging to a duplicate group.
    pub fn flagged_count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// Flagged row positions in input order.
    pub fn flagged_rows(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.then_some(i))
            .collect()
    }

    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }
}

/// Group `records` by the key `key_fn` derives for each of them.
pub fn group_rows<F>(records: &[Record], key_fn: F) -> Grouping
where
    F: Fn(&Record) -> Key,
{
    let keys: Vec<Key> = records.iter().map(key_fn).collect();

    let mut slots: HashMap<&[String], usize> = HashMap::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();

    for (row, key) in keys.iter().enumerate() {
        let slot = *slots.entry(key.as_slice()).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(row);
    }

    let mut flags = vec![false; keys.len()];
    let groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|rows| rows.len() >= 2)
        .map(|rows| {
            for &row in &rows {
                flags[row] = true;
            }
            DuplicateGroup {
                key: keys[rows[0]].clone(),
                rows,
            }
        })
        .collect();

    Grouping { keys, flags, groups }
}
