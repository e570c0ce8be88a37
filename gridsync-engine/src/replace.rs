//! Full replace.
//!
//! Overwrites the table with a new matrix anchored at `origin`: write, then
//! resize the table to exactly the written block, then clear whatever the
//! old, taller table left below it.

use crate::engine::TableSync;
use crate::error::{EngineError, EngineResult, ReplaceStep};
use gridsync_types::{compute_range, CellAddress, Matrix, RangeSpec, ReplaceOutcome, TableHandle};
use tracing::{debug, info};

/// Rows below the new block that still hold old contents, if any.
///
/// Covers rows `origin.row + new_rows ..= origin.row + old_rows - 1`, across
/// the wider of the old and new column spans.
fn trailing_range(
    origin: CellAddress,
    new_rows: usize,
    new_cols: usize,
    extent: &RangeSpec,
) -> EngineResult<Option<RangeSpec>> {
    let old_rows = extent.row_count() as usize;
    if old_rows <= new_rows {
        return Ok(None);
    }
    let columns = new_cols.max(extent.column_count() as usize);
    let below = u32::try_from(new_rows)
        .map_err(|_| EngineError::validation(format!("{new_rows} rows is too many")))?;
    let start = origin.offset(below, 0)?;
    Ok(Some(compute_range(start, old_rows - new_rows, columns)?))
}

impl TableSync {
    /// Replaces the table's contents with `matrix`, header row included.
    ///
    /// The write range is validated before anything is sent. A remote failure
    /// aborts immediately and names the step that failed.
    pub async fn replace(
        &self,
        table: &TableHandle,
        matrix: &Matrix,
        origin: CellAddress,
    ) -> EngineResult<ReplaceOutcome> {
        table.validate()?;
        let new_rows = matrix.row_count();
        let new_cols = matrix.column_count();
        let write = compute_range(origin, new_rows, new_cols)?;

        let extent = self
            .workbook
            .table_extent(table)
            .await
            .map_err(|e| EngineError::at_step(ReplaceStep::ReadExtent, e))?;
        let cleared = trailing_range(origin, new_rows, new_cols, &extent)?;

        debug!(%table, %extent, %write, cleared = ?cleared.map(|r| r.to_string()), "Replace plan");

        self.workbook
            .write_range(table, &write, matrix)
            .await
            .map_err(|e| EngineError::at_step(ReplaceStep::Write, e))?;

        self.workbook
            .resize_table(table, &write)
            .await
            .map_err(|e| EngineError::at_step(ReplaceStep::Resize, e))?;

        if let Some(range) = &cleared {
            self.workbook
                .clear_contents(table, range)
                .await
                .map_err(|e| EngineError::at_step(ReplaceStep::ClearTrailing, e))?;
        }

        info!(%table, rows = new_rows, columns = new_cols, "Replace complete");

        Ok(ReplaceOutcome {
            success: true,
            row_count: new_rows,
            cleared,
        })
    }
}
