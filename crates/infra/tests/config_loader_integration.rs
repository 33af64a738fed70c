//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::path::PathBuf;
use std::time::Duration;

use nadctl_domain::{NadError, StateNonce};
use nadctl_infra::config;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write config file");
    path
}

#[test]
fn test_load_config_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "nadctl.toml",
        r#"
        [spotify]
        client_id = "toml-client"
        redirect_uri = "http://127.0.0.1:9999/cb"
        token_cache_path = "/tmp/nadctl-test/token.json"
        auth_timeout_seconds = 45
        state_nonce = { fixed = "nadctl-state" }

        [logging]
        filter = "debug"
        json = true
        "#,
    );

    let config = config::load_from_file(Some(path)).expect("TOML config should load");

    assert_eq!(config.spotify.client_id, "toml-client");
    assert_eq!(config.spotify.redirect_uri, "http://127.0.0.1:9999/cb");
    assert_eq!(
        config.spotify.token_cache_path,
        Some(PathBuf::from("/tmp/nadctl-test/token.json"))
    );
    assert_eq!(config.spotify.auth_timeout(), Duration::from_secs(45));
    assert_eq!(config.spotify.state_nonce, StateNonce::legacy());
    assert_eq!(config.logging.filter, "debug");
    assert!(config.logging.json);

    assert_eq!(
        config::token_cache_path(&config.spotify).unwrap(),
        PathBuf::from("/tmp/nadctl-test/token.json")
    );
}

#[test]
fn test_load_config_from_json_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "nadctl.json", r#"{ "spotify": { "client_id": "json-client" } }"#);

    let config = config::load_from_file(Some(path)).expect("JSON config should load");

    assert_eq!(config.spotify.client_id, "json-client");
    assert_eq!(config.spotify.redirect_uri, "http://localhost:8888/callback");
    assert_eq!(config.spotify.state_nonce, StateNonce::Random);
    assert_eq!(config.spotify.api_base_url, "https://api.spotify.com/v1");
    assert_eq!(config.logging.filter, "info");
}

#[test]
fn test_missing_file_is_config_error() {
    let result = config::load_from_file(Some(PathBuf::from("/nonexistent/nadctl.toml")));
    assert!(matches!(result, Err(NadError::Config(_))));
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "nadctl.toml", "[spotify\nclient_id = ");

    match config::load_from_file(Some(path)) {
        Err(NadError::Config(msg)) => assert!(msg.contains("Invalid TOML")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_empty_client_id_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "nadctl.toml", "[spotify]\nclient_id = \"  \"\n");

    assert!(matches!(config::load_from_file(Some(path)), Err(NadError::Config(_))));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "nadctl.yaml", "spotify:\n  client_id: abc\n");

    match config::load_from_file(Some(path)) {
        Err(NadError::Config(msg)) => assert!(msg.contains("Unsupported config format")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_default_token_cache_path_layout() {
    if let Ok(path) = config::default_token_cache_path() {
        assert!(path.ends_with("nadctl/spotify_token.json"));
    }
}
