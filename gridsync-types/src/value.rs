//! Typed cell values and rectangular matrices.

use crate::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// A single spreadsheet cell value.
///
/// The remote API hands back strings, numbers, booleans and blanks; booleans
/// are folded into their spreadsheet text form so every consumer only has to
/// match three cases.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

impl CellValue {
    /// Builds a text cell, mapping the empty string to [`CellValue::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Renders the value the way a spreadsheet shows it in a plain cell.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s.as_str()),
            Self::Number(n) => Cow::Owned(format_number(*n)),
            Self::Empty => Cow::Borrowed(""),
        }
    }

    /// Numeric view: numbers directly, text only if it parses as a finite number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Empty => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CellVisitor;

        impl<'de> Visitor<'de> for CellVisitor {
            type Value = CellValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number, boolean or null")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<CellValue, E> {
                Ok(CellValue::text(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<CellValue, E> {
                Ok(CellValue::text(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<CellValue, E> {
                Ok(CellValue::Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<CellValue, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<CellValue, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<CellValue, E> {
                Ok(CellValue::Text(if v { "TRUE" } else { "FALSE" }.to_string()))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<CellValue, E> {
                Ok(CellValue::Empty)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<CellValue, E> {
                Ok(CellValue::Empty)
            }
        }

        deserializer.deserialize_any(CellVisitor)
    }
}

/// A non-empty, rectangular block of cells.
///
/// Row 0 is the header row whenever keys are involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<CellValue>>", into = "Vec<Vec<CellValue>>")]
pub struct Matrix {
    rows: Vec<Vec<CellValue>>,
}

impl Matrix {
    /// Validates shape and wraps the rows.
    pub fn new(rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let first = rows.first().ok_or(Error::EmptyMatrix)?;
        let expected = first.len();
        if expected == 0 {
            return Err(Error::NoColumns);
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(Error::Ragged {
                row,
                expected,
                actual: r.len(),
            });
        }
        Ok(Self { rows })
    }

    /// Convenience constructor for string-only matrices.
    pub fn from_strings<R, C>(rows: R) -> Result<Self>
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<CellValue>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// The first row.
    #[must_use]
    pub fn header(&self) -> &[CellValue] {
        &self.rows[0]
    }

    /// Every row after the header.
    #[must_use]
    pub fn body(&self) -> &[Vec<CellValue>] {
        &self.rows[1..]
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows[0].len()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }
}

impl TryFrom<Vec<Vec<CellValue>>> for Matrix {
    type Error = Error;

    fn try_from(rows: Vec<Vec<CellValue>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<Matrix> for Vec<Vec<CellValue>> {
    fn from(matrix: Matrix) -> Self {
        matrix.rows
    }
}
