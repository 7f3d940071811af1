use super::{default_config, load_config, load_config_optional, validate_config};
use crate::store::GeoBounds;

fn write_file(path: &std::path::Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents.as_bytes()).expect("write file");
}

#[test]
fn default_config_is_valid() {
    let config = default_config();
    validate_config(&config).expect("defaults validate");
    assert_eq!(config.workers, 5);
    assert_eq!(config.save_interval, 50);
    assert_eq!(config.bounds, GeoBounds::TAIWAN);
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("enrich.json");
    write_file(
        &path,
        r#"{"schema_version": 1, "workers": 8, "services": {"language": "en"}}"#,
    );

    let config = load_config(&path).expect("load config");
    assert_eq!(config.workers, 8);
    assert_eq!(config.save_interval, 50);
    assert_eq!(config.services.language, "en");
    assert_eq!(config.services.region, "tw");
    validate_config(&config).expect("partial config validates");
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("enrich.json");
    write_file(&path, r#"{"schema_version": 1, "max_workers": 8}"#);
    assert!(load_config(&path).is_err());
}

#[test]
fn missing_file_is_an_error_but_absent_path_is_default() {
    let dir = tempfile::tempdir().expect("create temp dir");
    assert!(load_config_optional(Some(&dir.path().join("missing.json"))).is_err());
    assert_eq!(
        load_config_optional(None).expect("defaults"),
        default_config()
    );
}

#[test]
fn rejects_degenerate_values() {
    let mut config = default_config();
    config.workers = 0;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.save_interval = 0;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.timeout_ms = 0;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.bounds.min_latitude = 30.0;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.services.geocode_url = "ftp://example.org".to_string();
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.schema_version = 99;
    let err = validate_config(&config).expect_err("schema mismatch");
    assert!(err.to_string().contains("schema_version"));
}
