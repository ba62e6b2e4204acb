//! Integration tests for configuration parsing and handling.
//!
//! These tests verify that `sift.toml` files load, that overrides apply, and
//! that a loaded configuration drives the filter engine.

use std::io::Write;

use sift::query::{Combinator, FilterClause, FilterEngine, FilterSpec};
use sift::schema::{CombinatorSetting, ColumnType, Row, Schema, SchemaError, SiftConfig, Table};

/// Test that an empty file yields defaults
#[test]
fn test_config_empty() {
    let config = SiftConfig::from_str("").expect("Failed to parse config");
    assert_eq!(config.engine.parallel_threshold, 65_536);
    assert_eq!(config.engine.worker_threads, 0);
    assert_eq!(config.filter.default_combinator, CombinatorSetting::And);
    assert!(config.debug.log_level.is_none());
}

/// Test full configuration with all options
#[test]
fn test_config_full() {
    let config_str = r#"
        [engine]
        parallel_threshold = 100000
        worker_threads = 8

        [filter]
        default_combinator = "or"

        [debug]
        log_filters = true
        log_level = "debug"

        [environments.production.engine]
        worker_threads = 32

        [environments.production.debug]
        log_filters = false
        log_level = "warn"
    "#;

    let config = SiftConfig::from_str(config_str).expect("Failed to parse config");
    assert_eq!(config.engine.parallel_threshold, 100_000);
    assert_eq!(config.engine.worker_threads, 8);
    assert_eq!(config.filter.default_combinator, CombinatorSetting::Or);
    assert!(config.debug.log_filters);
    assert_eq!(config.debug.log_level.as_deref(), Some("debug"));
    assert!(config.environments.contains_key("production"));

    let production = config.with_environment("production");
    assert_eq!(production.engine.parallel_threshold, 100_000);
    assert_eq!(production.engine.worker_threads, 32);
    assert!(!production.debug.log_filters);
    assert_eq!(production.debug.log_level.as_deref(), Some("warn"));
}

/// Test that an unknown environment leaves the config unchanged
#[test]
fn test_config_unknown_environment() {
    let config = SiftConfig::from_str("[engine]\nworker_threads = 3\n")
        .expect("Failed to parse config")
        .with_environment("staging");
    assert_eq!(config.engine.worker_threads, 3);
}

/// Test environment variable interpolation with defaults
#[test]
fn test_config_env_var_default() {
    let config_str = r#"
        [engine]
        worker_threads = ${SIFT_CONFIG_TEST_UNSET_WORKERS:-6}
    "#;

    let config = SiftConfig::from_str(config_str).expect("Failed to parse config");
    assert_eq!(config.engine.worker_threads, 6);
}

/// Test invalid values are rejected
#[test]
fn test_config_invalid_values() {
    let err = SiftConfig::from_str("[filter]\ndefault_combinator = \"xor\"\n").unwrap_err();
    assert!(matches!(err, SchemaError::TomlError { .. }));

    let err = SiftConfig::from_str("[engine]\nparallel_threshold = -1\n").unwrap_err();
    assert!(matches!(err, SchemaError::TomlError { .. }));

    let err = SiftConfig::from_str("[database]\nurl = \"x\"\n").unwrap_err();
    assert!(matches!(err, SchemaError::TomlError { .. }));
}

/// Test loading from disk
#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "[filter]\ndefault_combinator = \"or\"").expect("Failed to write config");

    let config = SiftConfig::from_file(file.path()).expect("Failed to load config");
    assert_eq!(config.filter.default_combinator, CombinatorSetting::Or);

    let err = SiftConfig::from_file("/nonexistent/sift.toml").unwrap_err();
    assert!(matches!(err, SchemaError::IoError { .. }));
}

/// Test that a loaded config drives the engine
#[test]
fn test_config_drives_engine() {
    let config = SiftConfig::from_str(
        r#"
        [engine]
        parallel_threshold = 2
        worker_threads = 2

        [filter]
        default_combinator = "or"
        "#,
    )
    .expect("Failed to parse config");

    let engine = FilterEngine::from_config(&config);
    assert_eq!(engine.default_combinator(), Combinator::Or);

    let table = Table::with_rows(
        Schema::new().with_column("x", ColumnType::Integer),
        (1..=6).map(|x| Row::new().set("x", x)),
    )
    .expect("Failed to build table");

    let spec = engine
        .parse_spec(r#"{"filter": [["x", "<", 2], ["x", ">", 5]]}"#)
        .expect("Failed to parse spec");
    assert_eq!(spec.combinator, Combinator::Or);

    let mask = engine.evaluate_filter(&table, &spec);
    assert_eq!(mask.selected().collect::<Vec<_>>(), vec![0, 5]);

    let sequential = FilterEngine::new().evaluate_filter(&table, &spec);
    assert_eq!(mask, sequential);

    let explicit = FilterSpec::and([FilterClause::gt("x", 1), FilterClause::lt("x", 3)]);
    assert_eq!(engine.evaluate_filter(&table, &explicit).count(), 1);
}
