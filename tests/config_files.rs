//! Integration tests for loading configuration from disk
//!
//! Verifies the read → parse → validate phases keep their error context, and
//! the missing-file fallback used for the default config path.

use std::fs;
use tempfile::TempDir;
use tierroute::config::Config;
use tierroute::error::AppError;
use tokio_test::{assert_err, assert_ok};

fn write_config(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write config");
    path
}

#[test]
fn test_empty_file_loads_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "tierroute.toml", "");

    let config = assert_ok!(Config::from_file(&path));
    assert_eq!(config.proxy.base_url, "http://localhost:4000/v1");
    assert_eq!(config.models.l3, "l3-senior");
    assert_eq!(config.execution.max_local_retries, 2);
    assert_eq!(config.routing.max_local_tokens, 8000);
}

#[test]
fn test_partial_file_overrides_only_given_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "tierroute.toml",
        r#"
[models]
l1 = "ollama/qwen2.5-coder:7b"

[execution]
local_timeout_seconds = 60
"#,
    );

    let config = assert_ok!(Config::from_file(&path));
    assert_eq!(config.models.l1, "ollama/qwen2.5-coder:7b");
    assert_eq!(config.models.l2, "l2-junior");
    assert_eq!(config.execution.local_timeout_seconds, 60);
    assert_eq!(config.execution.escalation_timeout_seconds, 300);
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = assert_err!(Config::from_file(&path));
    match err {
        AppError::ConfigFileRead { path: p, source } => {
            assert!(p.ends_with("absent.toml"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected ConfigFileRead, got {:?}", other),
    }
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tierroute.toml");

    let config = assert_ok!(Config::from_file_or_default(&path));
    assert_eq!(config.server.port, 4100);
}

#[test]
fn test_fallback_still_reports_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "tierroute.toml", "[execution]\nmax_local_retries = 0\n");

    let err = assert_err!(Config::from_file_or_default(&path));
    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "broken.toml", "[proxy\nbase_url = ");

    let err = assert_err!(Config::from_file(&path));
    assert!(
        matches!(err, AppError::ConfigParseFailed { .. }),
        "expected ConfigParseFailed, got {:?}",
        err
    );
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_unknown_field_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "typo.toml", "[execution]\nmax_retries = 3\n");

    let err = assert_err!(Config::from_file(&path));
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_validation_error_names_file_and_field() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "bad.toml",
        "[execution]\nescalation_timeout_seconds = 7200\n",
    );

    let err = assert_err!(Config::from_file(&path));
    let message = err.to_string();
    assert!(message.contains("bad.toml"), "message: {}", message);
    assert!(
        message.contains("escalation_timeout_seconds"),
        "message: {}",
        message
    );
}

#[test]
fn test_base_url_without_v1_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "proxy.toml",
        "[proxy]\nbase_url = \"http://localhost:4000\"\n",
    );

    let err = assert_err!(Config::from_file(&path));
    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
}

#[test]
fn test_empty_keyword_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "kw.toml", "[routing]\nl1_keywords = [\"ls\", \"\"]\n");

    let err = assert_err!(Config::from_file(&path));
    assert!(err.to_string().contains("l1_keywords"));
}

#[test]
fn test_unknown_log_level_names_file_and_field() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "levels.toml", "[observability]\nlog_level = \"verbose\"\n");

    let err = assert_err!(Config::from_file(&path));
    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
    let message = err.to_string();
    assert!(message.contains("levels.toml"), "message: {}", message);
    assert!(message.contains("log_level"), "message: {}", message);
}
