//! Cell address algebra.
//!
//! Converts between A1-style references and `(column, row)` coordinates,
//! where columns are 0-based and rows are 1-based, and derives ranges from
//! matrix dimensions.
//!
//! Column letters use bijective base-26 (no zero digit): `0 -> A`,
//! `25 -> Z`, `26 -> AA`, `701 -> ZZ`, `702 -> AAA`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// A single cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellAddress {
    /// 0-based column index.
    pub column: u32,
    /// 1-based row number.
    pub row: u32,
}

impl CellAddress {
    /// The top-left cell, `A1`.
    pub const ORIGIN: Self = Self { column: 0, row: 1 };

    /// Creates an address. `row` is clamped to at least 1.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        let row = if row == 0 { 1 } else { row };
        Self { column, row }
    }

    /// Returns the address `rows` below and `columns` right of this one.
    pub fn offset(&self, rows: u32, columns: u32) -> Result<Self> {
        let row = self
            .row
            .checked_add(rows)
            .ok_or_else(|| Error::InvalidRange(format!("row overflow from {self}")))?;
        let column = self
            .column
            .checked_add(columns)
            .ok_or_else(|| Error::InvalidRange(format!("column overflow from {self}")))?;
        Ok(Self { column, row })
    }
}

impl Default for CellAddress {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.column), self.row)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        try_parse_cell(s)
    }
}

impl TryFrom<String> for CellAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        try_parse_cell(&value)
    }
}

impl From<CellAddress> for String {
    fn from(value: CellAddress) -> Self {
        value.to_string()
    }
}

/// A rectangular span of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeSpec {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl RangeSpec {
    /// Number of rows covered. An inverted range covers none.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        span(self.start.row, self.end.row)
    }

    /// Number of columns covered. An inverted range covers none.
    #[must_use]
    pub fn column_count(&self) -> u32 {
        span(self.start.column, self.end.column)
    }
}

fn span(first: u32, last: u32) -> u32 {
    last.checked_sub(first).map_or(0, |d| d.saturating_add(1))
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for RangeSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_range(s)
    }
}

impl TryFrom<String> for RangeSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        parse_range(&value)
    }
}

impl From<RangeSpec> for String {
    fn from(value: RangeSpec) -> Self {
        value.to_string()
    }
}

/// Encodes a 0-based column index as spreadsheet letters.
#[must_use]
pub fn column_letter(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

/// Parses an A1 reference, falling back to `A1` when it cannot be parsed.
///
/// Kept for compatibility with callers that hand over loosely formatted
/// references. Anything user-supplied should go through [`try_parse_cell`].
#[must_use]
pub fn parse_cell(reference: &str) -> CellAddress {
    match try_parse_cell(reference) {
        Ok(address) => address,
        Err(_) => {
            warn!(reference, "unparseable cell reference, falling back to A1");
            CellAddress::ORIGIN
        }
    }
}

/// Strictly parses an A1 reference such as `B7`, `$AA$10` or `Sheet1!C3`.
pub fn try_parse_cell(reference: &str) -> Result<CellAddress> {
    let invalid = || Error::InvalidCell(reference.to_string());

    let trimmed = reference.trim();
    let cell = match trimmed.rsplit_once('!') {
        Some((_, cell)) => cell.trim(),
        None => trimmed,
    };

    let mut letters = String::new();
    let mut digits = String::new();
    for ch in cell.chars() {
        match ch {
            '$' => continue,
            c if c.is_ascii_alphabetic() => {
                if !digits.is_empty() {
                    return Err(invalid());
                }
                letters.push(c.to_ascii_uppercase());
            }
            c if c.is_ascii_digit() => digits.push(c),
            _ => return Err(invalid()),
        }
    }

    if letters.is_empty() || digits.is_empty() {
        return Err(invalid());
    }

    let column = column_index(&letters).ok_or_else(invalid)?;
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok(CellAddress { column, row })
}

/// Strictly parses `A1:D10` (or a single cell, treated as a one-cell range).
pub fn parse_range(range: &str) -> Result<RangeSpec> {
    let trimmed = range.trim();
    let body = match trimmed.rsplit_once('!') {
        Some((_, body)) => body,
        None => trimmed,
    };
    let (start, end) = match body.split_once(':') {
        Some((start, end)) => (try_parse_cell(start)?, try_parse_cell(end)?),
        None => {
            let cell = try_parse_cell(body)?;
            (cell, cell)
        }
    };
    if end.row < start.row || end.column < start.column {
        return Err(Error::InvalidRange(format!("{range} is inverted")));
    }
    Ok(RangeSpec { start, end })
}

/// Derives the range a `num_rows` x `num_cols` block occupies from `origin`.
pub fn compute_range(origin: CellAddress, num_rows: usize, num_cols: usize) -> Result<RangeSpec> {
    if num_rows == 0 || num_cols == 0 {
        return Err(Error::InvalidRange(format!(
            "cannot place a {num_rows}x{num_cols} block"
        )));
    }
    let rows = u32::try_from(num_rows - 1)
        .map_err(|_| Error::InvalidRange(format!("{num_rows} rows is too many")))?;
    let cols = u32::try_from(num_cols - 1)
        .map_err(|_| Error::InvalidRange(format!("{num_cols} columns is too many")))?;
    let end = origin.offset(rows, cols)?;
    Ok(RangeSpec { start: origin, end })
}

fn column_index(letters: &str) -> Option<u32> {
    let mut acc: u64 = 0;
    for b in letters.bytes() {
        acc = acc.checked_mul(26)?.checked_add(u64::from(b - b'A' + 1))?;
        if acc > u64::from(u32::MAX) + 1 {
            return None;
        }
    }
    u32::try_from(acc.checked_sub(1)?).ok()
}
