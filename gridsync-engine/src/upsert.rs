//! Key-based upsert.
//!
//! Input rows are matched against the live table by a composite key built
//! from normalized key-column values. Matches are overwritten in place at
//! their current index; everything else is appended. Each row write stands
//! alone, so one failing row never stops the rest.

use crate::engine::TableSync;
use crate::error::{EngineError, EngineResult};
use gridsync_types::{
    header_matches, CellValue, CompositeKey, ExistingRow, KeyKind, Matrix, RowError, TableHandle,
    UpsertOutcome,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Where each key column lives in one particular header row.
#[derive(Debug)]
struct KeyColumns {
    columns: Vec<(usize, KeyKind)>,
}

impl KeyColumns {
    /// Locates every key in `headers`, or returns the first missing name.
    fn resolve<'a>(headers: &[String], keys: &'a [String]) -> Result<Self, &'a str> {
        let columns = keys
            .iter()
            .map(|key| {
                headers
                    .iter()
                    .position(|h| header_matches(h, key))
                    .map(|index| (index, KeyKind::for_column(key)))
                    .ok_or(key.as_str())
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { columns })
    }

    fn key_for(&self, values: &[CellValue]) -> CompositeKey {
        CompositeKey::new(
            self.columns
                .iter()
                .map(|(index, kind)| kind.normalize(values.get(*index).unwrap_or(&CellValue::Empty)))
                .collect(),
        )
    }
}

/// Maps remote column positions to input column positions by header name.
#[derive(Debug)]
struct ColumnLayout {
    sources: Vec<Option<usize>>,
}

impl ColumnLayout {
    fn new(input: &[String], remote: &[String]) -> Self {
        let sources = remote
            .iter()
            .map(|name| input.iter().position(|h| header_matches(h, name)))
            .collect();
        Self { sources }
    }

    /// Input columns with no remote counterpart. Their values are dropped.
    fn unmatched<'a>(&self, input: &'a [String]) -> Vec<&'a str> {
        input
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.sources.contains(&Some(*i)))
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Lays `row` out in remote order. Remote columns the input lacks keep
    /// the existing value, or stay blank for a new row.
    fn project(&self, row: &[CellValue], existing: Option<&[CellValue]>) -> Vec<CellValue> {
        self.sources
            .iter()
            .enumerate()
            .map(|(remote, source)| match source {
                Some(input) => row.get(*input).cloned().unwrap_or_default(),
                None => existing
                    .and_then(|values| values.get(remote))
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect()
    }
}

enum RowWrite {
    Updated,
    Inserted,
}

fn header_names(matrix: &Matrix) -> Vec<String> {
    matrix
        .header()
        .iter()
        .map(|cell| cell.as_text().trim().to_string())
        .collect()
}

impl TableSync {
    /// Updates rows whose key already exists in `table` and appends the rest.
    ///
    /// Row 0 of `matrix` is the header. Row failures are collected in the
    /// outcome; validation and credential failures abort the call.
    pub async fn upsert(
        &self,
        table: &TableHandle,
        matrix: &Matrix,
        key_columns: &[String],
    ) -> EngineResult<UpsertOutcome> {
        table.validate()?;
        if key_columns.is_empty() {
            return Err(EngineError::validation("keyColumns must not be empty"));
        }
        if key_columns.iter().any(|k| k.trim().is_empty()) {
            return Err(EngineError::validation("keyColumns must not contain blank names"));
        }

        let input_headers = header_names(matrix);
        let input_keys = KeyColumns::resolve(&input_headers, key_columns).map_err(|missing| {
            EngineError::validation(format!("key column {missing:?} is not in the matrix header"))
        })?;

        let input_rows = matrix.body();
        if input_rows.is_empty() {
            debug!(%table, "No input rows, nothing to upsert");
            return Ok(UpsertOutcome::default());
        }

        let remote_headers = self.workbook.table_headers(table).await?;
        let remote_keys = KeyColumns::resolve(&remote_headers, key_columns).map_err(|missing| {
            EngineError::validation(format!("key column {missing:?} is not in the remote table"))
        })?;

        let layout = ColumnLayout::new(&input_headers, &remote_headers);
        let dropped = layout.unmatched(&input_headers);
        if !dropped.is_empty() {
            warn!(%table, columns = ?dropped, "Input columns missing from remote table are ignored");
        }

        let existing = self.existing_rows(table).await?;
        let mut by_key: HashMap<CompositeKey, &ExistingRow> = HashMap::with_capacity(existing.len());
        for row in &existing {
            by_key.entry(remote_keys.key_for(&row.values)).or_insert(row);
        }

        debug!(
            %table,
            input = input_rows.len(),
            existing = existing.len(),
            "Reconciling rows by key"
        );

        let mut outcome = UpsertOutcome::default();

        for (position, row) in input_rows.iter().enumerate() {
            let key = input_keys.key_for(row);

            let result = match by_key.get(&key) {
                Some(current) => {
                    let values = layout.project(row, Some(current.values.as_slice()));
                    self.workbook
                        .update_row(table, current.index, &values)
                        .await
                        .map(|()| RowWrite::Updated)
                }
                None => {
                    let values = layout.project(row, None);
                    self.workbook
                        .add_row(table, &values)
                        .await
                        .map(|()| RowWrite::Inserted)
                }
            };

            match result {
                Ok(RowWrite::Updated) => outcome.updated += 1,
                Ok(RowWrite::Inserted) => outcome.inserted += 1,
                Err(e) if e.is_auth() => return Err(e.into()),
                Err(e) => {
                    let context = format!("row {} (key {key})", position + 1);
                    warn!(%table, %context, error = %e, "Row write failed");
                    outcome.errors.push(RowError {
                        context,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            %table,
            updated = outcome.updated,
            inserted = outcome.inserted,
            failed = outcome.errors.len(),
            "Upsert complete"
        );

        Ok(outcome)
    }
}
