//! Core type definitions for gridsync.
//!
//! This crate defines the plugin-free building blocks shared by the graph
//! client, the reconciliation engine and the server:
//! - Remote table identity ([`TableHandle`])
//! - Cell address algebra ([`CellAddress`], [`RangeSpec`], [`address`])
//! - Typed cell values and rectangular matrices ([`CellValue`], [`Matrix`])
//! - Value normalization used for key matching ([`normalize`])
//! - Reconciliation inputs and outcomes ([`ExistingRow`], [`CompositeKey`],
//!   [`UpsertOutcome`], [`ReplaceOutcome`])
//!
//! Nothing here touches the network.

pub mod address;
pub mod normalize;
mod outcome;
mod table;
mod value;

pub use address::{
    column_letter, compute_range, parse_cell, parse_range, try_parse_cell, CellAddress,
    RangeSpec,
};
pub use normalize::{header_matches, normalize_date, normalize_text, normalize_time, KeyKind};
pub use outcome::{
    CompositeKey, ExistingRow, ReplaceOutcome, RowError, TableSnapshot, UpsertOutcome,
};
pub use table::TableHandle;
pub use value::{CellValue, Matrix};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or validating core types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid cell reference: {0:?}")]
    InvalidCell(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("matrix must contain at least one row")]
    EmptyMatrix,

    #[error("matrix must contain at least one column")]
    NoColumns,

    #[error("matrix row {row} has {actual} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid table handle: {0}")]
    InvalidTable(String),
}
