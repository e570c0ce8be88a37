//! Reconciliation inputs and results.

use crate::{CellValue, RangeSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the live remote table, as read at the start of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingRow {
    /// Zero-based position within the table body.
    pub index: u32,
    pub values: Vec<CellValue>,
}

/// Ordered tuple of normalized key-column values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    pub const SEPARATOR: &'static str = "|";

    #[must_use]
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(Self::SEPARATOR))
    }
}

/// A single row that could not be written. Collected, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Which row failed, e.g. `row 3 (key 2024-01-10|08:00|Alice)`.
    pub context: String,
    pub message: String,
}

/// Aggregate result of a key-based upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub updated: usize,
    pub inserted: usize,
    pub errors: Vec<RowError>,
}

impl UpsertOutcome {
    /// True only when no row failed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of rewriting a whole table body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutcome {
    pub success: bool,
    /// Rows written, header included.
    pub row_count: usize,
    /// Trailing range whose contents were cleared, if the table shrank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared: Option<RangeSpec>,
}

/// Headers and rows of a remote table at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<ExistingRow>,
}
