//! The reconciliation entry point.

use crate::error::EngineResult;
use gridsync_graph::WorkbookClient;
use gridsync_types::{ExistingRow, TableHandle, TableSnapshot};
use tracing::debug;

/// Reconciles local matrices against remote workbook tables.
///
/// Holds no remote state; share one instance behind an `Arc`.
#[derive(Clone)]
pub struct TableSync {
    pub(crate) workbook: WorkbookClient,
}

impl TableSync {
    pub fn new(workbook: WorkbookClient) -> Self {
        Self { workbook }
    }

    pub fn workbook(&self) -> &WorkbookClient {
        &self.workbook
    }

    /// Reads the table's headers and body rows as they are right now.
    pub async fn read_rows(&self, table: &TableHandle) -> EngineResult<TableSnapshot> {
        table.validate()?;
        let headers = self.workbook.table_headers(table).await?;
        let rows = self.existing_rows(table).await?;
        debug!(%table, columns = headers.len(), rows = rows.len(), "Read table");
        Ok(TableSnapshot { headers, rows })
    }

    /// Body rows, treating a missing rows collection as an empty table.
    pub(crate) async fn existing_rows(&self, table: &TableHandle) -> EngineResult<Vec<ExistingRow>> {
        match self.workbook.table_rows(table).await {
            Ok(rows) => Ok(rows),
            Err(e) if e.is_not_found() => {
                debug!(%table, "Rows collection not found, treating table as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}
