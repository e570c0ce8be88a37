//! Typed workbook table operations.
//!
//! Thin wrappers that build resource paths for a [`TableHandle`] and turn
//! the API's JSON into `gridsync-types` values.

use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};
use crate::transport::Transport;
use gridsync_types::{parse_range, CellValue, ExistingRow, Matrix, RangeSpec, TableHandle};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Collection<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableColumn {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    index: u32,
    values: Vec<Vec<CellValue>>,
}

#[derive(Debug, Deserialize)]
struct RangeAddress {
    address: String,
}

/// Table-level operations against one drive.
#[derive(Clone)]
pub struct WorkbookClient {
    transport: Arc<Transport>,
    drive_path: String,
}

impl WorkbookClient {
    pub fn new(transport: Arc<Transport>, config: &GraphConfig) -> Self {
        Self {
            transport,
            drive_path: config.drive_path.trim_end_matches('/').to_string(),
        }
    }

    fn workbook_path(&self, table: &TableHandle) -> String {
        format!(
            "{}/items/{}/workbook",
            self.drive_path,
            urlencoding::encode(&table.document_id)
        )
    }

    fn table_path(&self, table: &TableHandle) -> String {
        format!(
            "{}/tables/{}",
            self.workbook_path(table),
            urlencoding::encode(&table.table_id)
        )
    }

    fn range_path(&self, table: &TableHandle, range: &RangeSpec) -> String {
        format!(
            "{}/worksheets/{}/range(address='{}')",
            self.workbook_path(table),
            urlencoding::encode(&table.sheet_id),
            range
        )
    }

    /// Column names in table order.
    pub async fn table_headers(&self, table: &TableHandle) -> GraphResult<Vec<String>> {
        let path = format!("{}/columns?$select=name", self.table_path(table));
        let columns: Vec<TableColumn> = self.collect_pages(path).await?;
        Ok(columns.into_iter().map(|c| c.name).collect())
    }

    /// Every body row with its live index.
    pub async fn table_rows(&self, table: &TableHandle) -> GraphResult<Vec<ExistingRow>> {
        let path = format!("{}/rows", self.table_path(table));
        let rows: Vec<TableRow> = self.collect_pages(path).await?;
        Ok(rows
            .into_iter()
            .map(|row| ExistingRow {
                index: row.index,
                values: row.values.into_iter().next().unwrap_or_default(),
            })
            .collect())
    }

    /// Overwrites the row at `index` with `values`.
    pub async fn update_row(
        &self,
        table: &TableHandle,
        index: u32,
        values: &[CellValue],
    ) -> GraphResult<()> {
        let path = format!("{}/rows/itemAt(index={index})", self.table_path(table));
        self.transport
            .patch(&path, &json!({ "values": [values] }))
            .await?;
        Ok(())
    }

    /// Appends one row at the end of the table.
    pub async fn add_row(&self, table: &TableHandle, values: &[CellValue]) -> GraphResult<()> {
        let path = format!("{}/rows/add", self.table_path(table));
        self.transport
            .post(&path, &json!({ "index": null, "values": [values] }))
            .await?;
        Ok(())
    }

    /// The sheet range the table occupies, header row included.
    pub async fn table_extent(&self, table: &TableHandle) -> GraphResult<RangeSpec> {
        let path = format!("{}/range?$select=address", self.table_path(table));
        let value = self.transport.get(&path).await?;
        let range: RangeAddress = serde_json::from_value(value)?;
        parse_range(&range.address).map_err(|e| {
            GraphError::UnexpectedResponse(format!("table address {:?}: {e}", range.address))
        })
    }

    /// Writes `matrix` into `range` on the table's worksheet.
    pub async fn write_range(
        &self,
        table: &TableHandle,
        range: &RangeSpec,
        matrix: &Matrix,
    ) -> GraphResult<()> {
        debug!(%table, %range, rows = matrix.row_count(), "Writing range");
        self.transport
            .patch(&self.range_path(table, range), &json!({ "values": matrix.rows() }))
            .await?;
        Ok(())
    }

    /// Moves the table boundary to exactly `range`.
    pub async fn resize_table(&self, table: &TableHandle, range: &RangeSpec) -> GraphResult<()> {
        let path = format!("{}/resize", self.table_path(table));
        self.transport
            .post(&path, &json!({ "newRange": range.to_string() }))
            .await?;
        Ok(())
    }

    /// Clears cell contents in `range`, leaving formatting alone.
    pub async fn clear_contents(&self, table: &TableHandle, range: &RangeSpec) -> GraphResult<()> {
        let path = format!("{}/clear", self.range_path(table, range));
        self.transport
            .post(&path, &json!({ "applyTo": "Contents" }))
            .await?;
        Ok(())
    }

    /// Follows `@odata.nextLink` until the collection is exhausted.
    async fn collect_pages<T: for<'de> Deserialize<'de>>(&self, first: String) -> GraphResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);
        while let Some(path) = next {
            let value = self.transport.get(&path).await?;
            let page: Collection<T> = serde_json::from_value(value)?;
            items.extend(page.value);
            next = page.next_link;
        }
        Ok(items)
    }
}
