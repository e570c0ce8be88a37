//! Shared test helpers for engine tests.

#![allow(dead_code)]

use gridsync_engine::TableSync;
use gridsync_graph::{GraphConfig, RetryPolicy, StaticToken, Transport, WorkbookClient};
use gridsync_types::{Matrix, TableHandle};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TABLE: &str = "/me/drive/items/doc-1/workbook/tables/Schedule";
pub const SHEET: &str = "/me/drive/items/doc-1/workbook/worksheets/Sheet1";

pub fn handle() -> TableHandle {
    TableHandle::new("doc-1", "Sheet1", "Schedule")
}

pub fn table_json() -> Value {
    json!({"documentId": "doc-1", "sheetId": "Sheet1", "tableId": "Schedule"})
}

/// A `TableSync` pointed at the mock server with fast retries.
pub fn sync(server: &MockServer) -> TableSync {
    let config = GraphConfig {
        api_base_url: server.uri(),
        retry: RetryPolicy {
            max_retries: 1,
            base_delay_ms: 10,
            max_retry_after_secs: 1,
        },
        ..Default::default()
    };
    let transport = Transport::new(&config, Arc::new(StaticToken::new("test-token"))).unwrap();
    TableSync::new(WorkbookClient::new(Arc::new(transport), &config))
}

/// Builds a matrix from a JSON array of rows.
pub fn matrix(rows: Value) -> Matrix {
    serde_json::from_value(rows).unwrap()
}

pub async fn mount_headers(server: &MockServer, names: &[&str]) {
    let columns: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/columns")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": columns})))
        .mount(server)
        .await;
}

/// Mounts the rows collection; row `i` gets index `i`.
pub async fn mount_rows(server: &MockServer, rows: Vec<Value>) {
    let value: Vec<Value> = rows
        .into_iter()
        .enumerate()
        .map(|(index, values)| json!({"index": index, "values": [values]}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/rows")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": value})))
        .mount(server)
        .await;
}

pub async fn mount_extent(server: &MockServer, address: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/range")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": address})))
        .mount(server)
        .await;
}

pub fn range_path(address: &str) -> String {
    format!("{SHEET}/range(address='{address}')")
}
