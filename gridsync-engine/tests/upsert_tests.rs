mod common;

use common::{handle, matrix, mount_headers, mount_rows, sync, TABLE};
use gridsync_engine::EngineError;
use gridsync_types::{TableHandle, UpsertOutcome};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADERS: [&str; 4] = ["Date", "Start Time", "Instructor", "Room"];

fn keys() -> Vec<String> {
    vec!["Date".to_string(), "Start Time".to_string()]
}

async fn expect_patch(server: &MockServer, index: u32, values: serde_json::Value, times: u64) {
    Mock::given(method("PATCH"))
        .and(path(format!("{TABLE}/rows/itemAt(index={index})")))
        .and(body_json(json!({"values": [values]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"index": index})))
        .expect(times)
        .mount(server)
        .await;
}

async fn expect_no_writes(server: &MockServer) {
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(server)
        .await;
}

// ── Matching ────────────────────────────────────────────────────

#[tokio::test]
async fn matching_row_is_updated_in_place() {
    let server = MockServer::start().await;
    mount_headers(&server, &HEADERS).await;
    mount_rows(
        &server,
        vec![
            json!([45301, 0.5, "Ann", "R1"]),
            json!([45302, 0.375, "Bob", "R2"]),
        ],
    )
    .await;

    // 11/1/2024 is 11 January (day first) and 09:00 is 0.375 of a day.
    expect_patch(&server, 1, json!(["11/1/2024", "09:00", "Bob", "R9"]), 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let input = matrix(json!([
        ["date", "start_time", "instructor", "room"],
        ["11/1/2024", "09:00", "Bob", "R9"]
    ]));
    let outcome = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap();

    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.inserted, 0);
    assert!(outcome.success());
}

const SCHEDULE: [&str; 4] = ["date", "start_time", "instructor", "program"];

fn schedule_keys() -> Vec<String> {
    ["date", "start_time", "instructor"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

#[tokio::test]
async fn changed_program_updates_matching_row() {
    let server = MockServer::start().await;
    mount_headers(&server, &SCHEDULE).await;
    mount_rows(&server, vec![json!(["2024-01-10", "08:00", "Alice", "Yoga"])]).await;

    expect_patch(&server, 0, json!(["2024-01-10", "08:00", "Alice", "Pilates"]), 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let input = matrix(json!([
        ["date", "start_time", "instructor", "program"],
        ["2024-01-10", "08:00", "Alice", "Pilates"]
    ]));
    let outcome = sync(&server)
        .upsert(&handle(), &input, &schedule_keys())
        .await
        .unwrap();

    assert_eq!(outcome, UpsertOutcome { updated: 1, inserted: 0, errors: vec![] });
}

#[tokio::test]
async fn repeated_input_key_patches_the_same_row_twice() {
    let server = MockServer::start().await;
    mount_headers(&server, &SCHEDULE).await;
    mount_rows(&server, vec![json!(["2024-01-10", "08:00", "Alice", "Yoga"])]).await;

    Mock::given(method("PATCH"))
        .and(path(format!("{TABLE}/rows/itemAt(index=0)")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"index": 0})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    // Both rows normalize to 2024-01-10|08:00|Alice.
    let input = matrix(json!([
        ["date", "start_time", "instructor", "program"],
        ["2024-01-10", "08:00", "Alice", "Pilates"],
        ["10/1/2024", "8:00", "Alice", "Spin"]
    ]));
    let outcome = sync(&server)
        .upsert(&handle(), &input, &schedule_keys())
        .await
        .unwrap();

    assert_eq!(outcome.updated, 2);
    assert_eq!(outcome.inserted, 0);
    assert!(outcome.success());
}

#[tokio::test]
async fn first_remote_duplicate_wins() {
    let server = MockServer::start().await;
    mount_headers(&server, &HEADERS).await;
    mount_rows(
        &server,
        vec![
            json!(["2024-01-10", "08:00", "Ann", "R1"]),
            json!(["2024-01-10", "08:00", "Ann (copy)", "R1"]),
        ],
    )
    .await;
    // Values travel as written; only the key is normalized.
    expect_patch(&server, 0, json!(["2024-01-10", "8:00", "Cat", "R3"]), 1).await;
    Mock::given(method("PATCH"))
        .and(path(format!("{TABLE}/rows/itemAt(index=1)")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let input = matrix(json!([
        ["Date", "Start Time", "Instructor", "Room"],
        ["2024-01-10", "8:00", "Cat", "R3"]
    ]));
    let outcome = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap();
    assert_eq!(outcome.updated, 1);
}

#[tokio::test]
async fn columns_are_realigned_and_missing_ones_keep_remote_values() {
    let server = MockServer::start().await;
    mount_headers(&server, &HEADERS).await;
    mount_rows(&server, vec![json!(["2024-01-10", "08:00", "Ann", "R1"])]).await;

    expect_patch(&server, 0, json!(["2024-01-10", "08:00", "Zed", "R1"]), 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .and(body_json(json!({"index": null, "values": [["2024-01-11", "10:00", "Yan", ""]]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    // Different order, no Room column, plus a column the table lacks.
    let input = matrix(json!([
        ["Instructor", "Notes", "Start Time", "Date"],
        ["Zed", "ignored", "08:00", "2024-01-10"],
        ["Yan", "ignored", "10:00", "2024-01-11"]
    ]));
    let outcome = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap();

    assert_eq!((outcome.updated, outcome.inserted), (1, 1));
}

// ── Inserts ─────────────────────────────────────────────────────

#[tokio::test]
async fn empty_table_inserts_every_row() {
    let server = MockServer::start().await;
    mount_headers(&server, &HEADERS).await;
    mount_rows(&server, vec![]).await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let input = matrix(json!([
        HEADERS,
        ["2024-01-10", "08:00", "Ann", "R1"],
        ["2024-01-10", "09:00", "Bob", "R1"],
        ["2024-01-11", "08:00", "Cat", "R2"]
    ]));
    let outcome = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap();

    assert_eq!(outcome.inserted, 3);
    assert_eq!(outcome.updated, 0);
}

#[tokio::test]
async fn missing_rows_collection_counts_as_empty_table() {
    let server = MockServer::start().await;
    mount_headers(&server, &HEADERS).await;
    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/rows")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "ItemNotFound", "message": "The requested resource doesn't exist."}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let input = matrix(json!([
        HEADERS,
        ["2024-01-10", "08:00", "Ann", "R1"],
        ["2024-01-10", "09:00", "Bob", "R1"],
        ["2024-01-11", "08:00", "Cat", "R2"]
    ]));
    let outcome = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap();
    assert_eq!(outcome.inserted, 3);
}

// ── Partial failure ─────────────────────────────────────────────

#[tokio::test]
async fn failing_row_is_recorded_and_others_continue() {
    let server = MockServer::start().await;
    mount_headers(&server, &HEADERS).await;
    mount_rows(&server, vec![]).await;

    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .and(body_json(json!({"index": null, "values": [["2024-01-10", "09:00", "Bob", "R1"]]})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": "GeneralException", "message": "boom"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let input = matrix(json!([
        HEADERS,
        ["2024-01-10", "08:00", "Ann", "R1"],
        ["2024-01-10", "09:00", "Bob", "R1"],
        ["2024-01-11", "08:00", "Cat", "R2"]
    ]));
    let outcome = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap();

    assert!(!outcome.success());
    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].context, "row 2 (key 2024-01-10|09:00)");
    assert!(outcome.errors[0].message.contains("boom"));
}

#[tokio::test]
async fn credential_failure_aborts_the_batch() {
    let server = MockServer::start().await;
    mount_headers(&server, &HEADERS).await;
    mount_rows(&server, vec![]).await;
    Mock::given(method("POST"))
        .and(path(format!("{TABLE}/rows/add")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let input = matrix(json!([
        HEADERS,
        ["2024-01-10", "08:00", "Ann", "R1"],
        ["2024-01-10", "09:00", "Bob", "R1"]
    ]));
    let err = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap_err();
    assert!(err.is_auth(), "got {err:?}");
}

// ── Validation ──────────────────────────────────────────────────

#[tokio::test]
async fn key_missing_from_matrix_fails_before_any_request() {
    let server = MockServer::start().await;
    let input = matrix(json!([["Date", "Instructor"], ["2024-01-10", "Ann"]]));

    let err = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(ref m) if m.contains("Start Time")));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_key_list_is_rejected() {
    let server = MockServer::start().await;
    let input = matrix(json!([HEADERS, ["2024-01-10", "08:00", "Ann", "R1"]]));

    let err = sync(&server).upsert(&handle(), &input, &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_table_handle_is_rejected() {
    let server = MockServer::start().await;
    let input = matrix(json!([HEADERS, ["2024-01-10", "08:00", "Ann", "R1"]]));
    let table = TableHandle::new("doc-1", "", "Schedule");

    let err = sync(&server).upsert(&table, &input, &keys()).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn key_missing_from_remote_table_writes_nothing() {
    let server = MockServer::start().await;
    mount_headers(&server, &["Date", "Instructor", "Room"]).await;
    mount_rows(&server, vec![]).await;
    expect_no_writes(&server).await;

    let input = matrix(json!([HEADERS, ["2024-01-10", "08:00", "Ann", "R1"]]));
    let err = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(ref m) if m.contains("remote table")));
}

#[tokio::test]
async fn header_only_matrix_is_a_no_op() {
    let server = MockServer::start().await;
    let input = matrix(json!([HEADERS]));

    let outcome = sync(&server).upsert(&handle(), &input, &keys()).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::default());
    assert!(server.received_requests().await.unwrap().is_empty());
}
