//! Duplicate detection and canonicalization.
//!
//! ```text
//! Table ──▶ KeyBuilder ──▶ group_rows ──▶ canonicalize ──▶ ExactReport
//!                │                    └──────────────────▶ CoreReport
//!                └─ FieldNormalizer (core rule only)
//! ```
//!
//! - [`keys`] - Equivalence keys per rule
//! - [`grouper`] - Equivalence classes and duplicate flags
//! - [`canonical`] - Survivor selection and display order
//! - [`report`] - Counts and identifier lists
//! - [`pipeline`] - End-to-end runs over files, buffers and tables

pub mod canonical;
pub mod grouper;
pub mod keys;
pub mod pipeline;
pub mod report;

pub use canonical::{canonicalize, Canonicalization, ExactNumber, IdentifierRank};
pub use grouper::{group_rows, DuplicateGroup, Grouping};
pub use keys::{check_columns, Key, KeyBuilder, Rule};
pub use pipeline::*;
pub use report::{CoreReport, ExactReport, GroupSummary};
