use firstfill::config::{Config, PLACEHOLDER_ACCESS_KEY, PLACEHOLDER_SECRET_KEY};
use firstfill::ErrorKind;
use std::env;
use std::fs;
use std::path::PathBuf;

fn filled() -> Config {
    let mut config = Config::default();
    config.credentials.access_key = "ak-0123".to_string();
    config.credentials.secret_key = "sk-4567".to_string();
    config
}

fn temp_dir(name: &str) -> PathBuf {
    let mut path = env::temp_dir();
    path.push(format!("firstfill_{name}_{}", std::process::id()));
    path
}

#[test]
fn filled_defaults_are_valid() {
    assert!(filled().validate().is_ok());
}

#[test]
fn placeholder_keys_are_rejected() {
    let mut config = filled();
    config.credentials.access_key = PLACEHOLDER_ACCESS_KEY.to_string();
    let err = config.validate().expect_err("placeholder access key");
    assert_eq!(err.kind, ErrorKind::Config);

    let mut config = filled();
    config.credentials.secret_key = PLACEHOLDER_SECRET_KEY.to_string();
    assert!(config.validate().is_err());
}

#[test]
fn blank_keys_are_rejected() {
    let mut config = filled();
    config.credentials.secret_key = "   ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn base_url_must_be_http() {
    let mut config = filled();
    config.base_url = "api.huobi.pro".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn timeout_must_be_positive() {
    let mut config = filled();
    config.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn quote_currency_must_be_lowercase_alphanumeric() {
    let mut config = filled();
    config.quote_currency = "USDT".to_string();
    assert!(config.validate().is_err());
    config.quote_currency = "us-dt".to_string();
    assert!(config.validate().is_err());
    config.quote_currency = "usdc".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn log_rotation_keeps_at_least_one_file() {
    let mut config = filled();
    config.log.max_files = 0;
    assert!(config.validate().is_err());
}

#[test]
fn log_rotation_needs_a_size_cap() {
    let config = Config::default();
    assert_eq!(config.log.max_bytes, 10 * 1024 * 1024);
    assert_eq!(config.log.max_files, 1);

    let mut config = filled();
    config.log.max_bytes = 0;
    assert!(config.validate().is_err());
}

#[test]
fn template_is_written_once_and_needs_editing() {
    let dir = temp_dir("template");
    let path = dir.join("config.toml");
    let path_str = path.to_str().expect("path");
    let _ = fs::remove_dir_all(&dir);

    assert!(Config::ensure_template(path_str).expect("write template"));
    assert!(!Config::ensure_template(path_str).expect("template exists"));

    let content = fs::read_to_string(&path).expect("read template");
    assert!(content.contains(PLACEHOLDER_ACCESS_KEY));
    assert!(content.contains(PLACEHOLDER_SECRET_KEY));
    assert!(content.contains("max_bytes"));

    // assumes FIRSTFILL_ACCESS_KEY and FIRSTFILL_SECRET_KEY are unset
    let err = Config::load(path_str).expect_err("placeholders must fail");
    assert_eq!(err.kind, ErrorKind::Config);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = temp_dir("malformed");
    fs::create_dir_all(&dir).expect("create dir");
    let path = dir.join("config.toml");
    fs::write(&path, "ACCESS_KEY = [").expect("write config");

    let err = Config::load(path.to_str().expect("path")).expect_err("parse error");
    assert_eq!(err.kind, ErrorKind::Config);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_a_config_error() {
    let err = Config::load("/nonexistent/firstfill/config.toml").expect_err("missing");
    assert_eq!(err.kind, ErrorKind::Config);
}
