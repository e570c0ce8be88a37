//! Value normalization.
//!
//! A spreadsheet can hand back the same date as `2024-01-10`, `10/1/2024`,
//! `2024-01-10T00:00:00` or the serial number `45301`, and the same time as
//! `8:00`, `08:00:00` or `0.3333`. Keys are only comparable once both sides
//! have been reduced to one canonical form, so local and remote values must
//! always go through the same function here.
//!
//! Every function is total and idempotent: unrecognized input comes back
//! trimmed, never as an error.

use crate::CellValue;
use chrono::{Days, NaiveDate};

/// Smallest serial number treated as a date (1968-06-11).
const SERIAL_DATE_MIN: f64 = 25_000.0;
/// Largest serial number treated as a date (2064-04-09).
const SERIAL_DATE_MAX: f64 = 60_000.0;
const MINUTES_PER_DAY: f64 = 1_440.0;

/// Zero-width and formatting characters that survive copy/paste but render
/// as nothing.
const INVISIBLE: &[char] = &[
    '\u{00AD}', // soft hyphen
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{200E}', // left-to-right mark
    '\u{200F}', // right-to-left mark
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte order mark
];

/// Canonicalizes a date cell to `YYYY-MM-DD`.
#[must_use]
pub fn normalize_date(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => serial_to_date(*n).unwrap_or_else(|| value.as_text().into_owned()),
        CellValue::Text(s) => normalize_date_str(s),
    }
}

fn normalize_date_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if has_iso_date_prefix(trimmed) {
        return trimmed[..10].to_string();
    }
    if let Some(iso) = day_month_year(trimmed) {
        return iso;
    }
    if let Some(iso) = trimmed.parse::<f64>().ok().and_then(serial_to_date) {
        return iso;
    }
    trimmed.to_string()
}

fn has_iso_date_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}

/// `D/M/YYYY` with one- or two-digit day and month.
fn day_month_year(s: &str) -> Option<String> {
    let mut parts = s.split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let short = |p: &str| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit());
    if !short(day) || !short(month) || year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Spreadsheet serial day numbers count from 1899-12-30.
fn serial_to_date(serial: f64) -> Option<String> {
    if !(SERIAL_DATE_MIN..=SERIAL_DATE_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_days(Days::new(serial.floor() as u64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Canonicalizes a time cell to `HH:MM`.
#[must_use]
pub fn normalize_time(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => {
            day_fraction_to_time(*n).unwrap_or_else(|| value.as_text().into_owned())
        }
        CellValue::Text(s) => normalize_time_str(s),
    }
}

fn normalize_time_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(hhmm) = clock_time(trimmed) {
        return hhmm;
    }
    if let Some(hhmm) = trimmed.parse::<f64>().ok().and_then(day_fraction_to_time) {
        return hhmm;
    }
    trimmed.to_string()
}

fn day_fraction_to_time(fraction: f64) -> Option<String> {
    if !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let minutes = ((fraction * MINUTES_PER_DAY).round() as u32).min(MINUTES_PER_DAY as u32 - 1);
    Some(format!("{:02}:{:02}", minutes / 60, minutes % 60))
}

/// `H:MM`, `HH:MM` or `HH:MM:SS`.
fn clock_time(s: &str) -> Option<String> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !parts.iter().all(|p| digits(p)) || parts[0].len() > 2 || parts[1..].iter().any(|p| p.len() != 2) {
        return None;
    }
    let hour: u32 = parts[0].parse().ok()?;
    let minute: u32 = parts[1].parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{hour:02}:{minute:02}"))
}

/// Strips invisible characters, collapses whitespace runs and trims.
#[must_use]
pub fn normalize_text(value: &CellValue) -> String {
    normalize_text_str(&value.as_text())
}

fn normalize_text_str(raw: &str) -> String {
    let visible: String = raw.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compares two column names the way the remote table does: case-insensitive,
/// ignoring stray whitespace and treating `_` like a space.
#[must_use]
pub fn header_matches(a: &str, b: &str) -> bool {
    header_key(a) == header_key(b)
}

fn header_key(name: &str) -> String {
    normalize_text_str(&name.replace('_', " ")).to_lowercase()
}

/// Which normalizer a key column goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Date,
    Time,
    Text,
}

impl KeyKind {
    /// Infers the kind from a column name (`date`, `start_time`, `instructor`).
    #[must_use]
    pub fn for_column(name: &str) -> Self {
        let key = header_key(name);
        let has_word = |word: &str| key.split(' ').any(|w| w == word);
        if has_word("date") {
            Self::Date
        } else if has_word("time") {
            Self::Time
        } else {
            Self::Text
        }
    }

    #[must_use]
    pub fn normalize(self, value: &CellValue) -> String {
        match self {
            Self::Date => normalize_date(value),
            Self::Time => normalize_time(value),
            Self::Text => normalize_text(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_epoch_is_1899_12_30() {
        // 45301 is 2024-01-10 in spreadsheet serial form.
        assert_eq!(serial_to_date(45301.0).as_deref(), Some("2024-01-10"));
        assert_eq!(serial_to_date(45301.75).as_deref(), Some("2024-01-10"));
        assert!(serial_to_date(24_999.0).is_none());
    }

    #[test]
    fn fraction_rounds_into_the_same_day() {
        assert_eq!(day_fraction_to_time(0.99999).as_deref(), Some("23:59"));
        assert_eq!(day_fraction_to_time(0.0).as_deref(), Some("00:00"));
    }
}
