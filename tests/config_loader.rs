mod common;

use countersync::config::{Config, ConfigError};
use std::path::PathBuf;

/// Test that Config::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.sync.endpoint, "http://127.0.0.1:8080");
    assert_eq!(config.sync.path, "/counter/sync");
    assert_eq!(config.sync.page_path, "/counter");
    assert_eq!(config.sync.target, "#server-count-value");
    assert_eq!(config.sync.quiet_period_ms, 5000);

    assert_eq!(config.csrf.cookie_name, "_gforge_csrf");
    assert_eq!(config.csrf.header_name, "X-CSRF-Token");

    assert!(config.prefetch.enabled);
    assert_eq!(config.prefetch.intent_delay_ms, 100);

    assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("countersync/config.toml"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let config = Config::load_from(&PathBuf::from("/nonexistent/countersync.toml")).unwrap();
    assert_eq!(config.sync.quiet_period_ms, 5000);
}

#[test]
fn test_partial_file_fills_defaults() {
    let (_dir, path) = common::temp_config(
        r#"
[sync]
endpoint = "http://localhost:3000"
quiet_period_ms = 250

[prefetch]
enabled = false
"#,
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.sync.endpoint, "http://localhost:3000");
    assert_eq!(config.sync.quiet_period_ms, 250);
    assert_eq!(config.sync.path, "/counter/sync");
    assert!(!config.prefetch.enabled);
    assert_eq!(config.prefetch.intent_delay_ms, 100);
    assert_eq!(config.csrf.cookie_name, "_gforge_csrf");
}

#[test]
fn test_parse_error_reports_path() {
    let (_dir, path) = common::temp_config("[sync\nendpoint = ");

    match Config::load_from(&path).unwrap_err() {
        ConfigError::ParseError { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_zero_quiet_period_rejected() {
    let (_dir, path) = common::temp_config("[sync]\nquiet_period_ms = 0\n");

    match Config::load_from(&path).unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("quiet_period_ms"));
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_relative_path_rejected() {
    let mut config = Config::default();
    config.sync.path = "counter/sync".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn test_bad_endpoint_rejected() {
    for endpoint in ["not a url", "ftp://example.com", "/relative"] {
        let mut config = Config::default();
        config.sync.endpoint = endpoint.to_string();
        assert!(config.validate().is_err(), "{} should be rejected", endpoint);
    }
}

#[test]
fn test_empty_target_and_csrf_names_rejected() {
    let mut config = Config::default();
    config.sync.target = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.csrf.header_name = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_bad_bind_addr_rejected() {
    let mut config = Config::default();
    config.server.bind_addr = "localhost".to_string();
    assert!(config.validate().is_err());
}
