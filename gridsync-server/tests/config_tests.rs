use gridsync_server::{ConfigError, ServerConfig};
use std::path::PathBuf;

#[test]
fn defaults_bind_locally() {
    let config = ServerConfig::default();
    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert_eq!(config.credentials_path, PathBuf::from("gridsync-credential.json"));
    assert_eq!(config.graph.retry.max_retries, 3);
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gridsync.json");
    std::fs::write(
        &path,
        r#"{"port": 9090, "graph": {"client_id": "app", "refresh_buffer_secs": 120}}"#,
    )
    .unwrap();

    let config = ServerConfig::from_file(&path).unwrap();
    assert_eq!(config.port, 9090);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.graph.client_id, "app");
    assert_eq!(config.graph.refresh_buffer_secs, 120);
    assert_eq!(config.graph.drive_path, "/me/drive");
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::from_file(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn invalid_json_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "port = 1").unwrap();

    let err = ServerConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.json"));
}
