//! Config files on disk: the shipped example and schema enforcement.

use std::path::PathBuf;

use asrun::config::load_config;
use asrun::ConfigError;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[test]
fn test_example_config_loads() {
    let config = load_config(repo_root().join("config.example.json")).unwrap();

    assert_eq!(config.version, "1.0");
    assert_eq!(config.watch_directory, "./monitored");
    assert_eq!(config.cut_threshold_secs, 30);
    assert_eq!(config.cut_service.base_url, "http://localhost:5000");
    assert_eq!(config.reconcile.interval_secs, 10);
}

#[test]
fn test_unknown_field_is_rejected_by_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "version": "1.0",
            "watch_directory": "./monitored",
            "cut_service": { "base_url": "http://localhost:5000" },
            "poll_interval": 10
        }"#,
    )
    .unwrap();

    assert!(matches!(
        load_config(&path),
        Err(ConfigError::SchemaValidation { .. })
    ));
}

#[test]
fn test_invalid_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(load_config(&path), Err(ConfigError::ParseJson(_))));
}
