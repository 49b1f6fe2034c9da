use std::fs;
use std::path::PathBuf;

use storewatch::error::{ConfigError, Error};
use storewatch::infrastructure::config::{Config, ConfigOverrides};
use tempfile::TempDir;

fn write_temp_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

const FULL: &str = r#"
seller_id = "12345"

[poll]
interval_secs = 60
fetch_timeout_secs = 15

[catalog]
url = "https://catalog.example/api/sellers/{seller_id}/listings"
sort_by_id = false

[cache]
path = "state/cache.json"
strict = true
prime_on_empty = false

[chats]
path = "state/chats.txt"

[broadcast]
concurrency = 2
send_timeout_secs = 3
shutdown_grace_secs = 1

[telegram]
enabled = false

[logging]
level = "warn"
format = "json"
"#;

#[test]
fn config_loads_every_section() {
    let dir = TempDir::new().unwrap();
    let path = write_temp_config(&dir, FULL);

    let config = Config::load(&path).expect("valid config");

    assert_eq!(config.seller_id, "12345");
    assert_eq!(config.poll.interval_secs, 60);
    assert!(!config.catalog.sort_by_id);
    assert!(config.cache.strict);
    assert_eq!(config.chats.path, PathBuf::from("state/chats.txt"));
    assert_eq!(config.broadcast.concurrency, 2);
    assert!(!config.telegram.enabled);
    assert!(config.telegram.active_token().is_none());
    assert_eq!(config.logging.format, "json");
    assert_eq!(
        config.catalog_url().unwrap().as_str(),
        "https://catalog.example/api/sellers/12345/listings"
    );
}

#[test]
fn config_rejects_missing_seller() {
    let dir = TempDir::new().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
[catalog]
url = "https://catalog.example/{seller_id}"
"#,
    );

    match Config::load(&path) {
        Err(Error::Config(ConfigError::MissingField { field: "seller_id" })) => {}
        Err(err) => panic!("Expected missing seller error, got {err}"),
        Ok(config) => panic!("Expected rejection, got seller {}", config.seller_id),
    }
}

#[test]
fn config_rejects_zero_interval() {
    let dir = TempDir::new().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
seller_id = "1"

[poll]
interval_secs = 0

[catalog]
url = "https://catalog.example/{seller_id}"
"#,
    );

    match Config::load(&path) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "poll.interval_secs",
            ..
        })) => {}
        Err(err) => panic!("Expected invalid interval error, got {err}"),
        Ok(_) => panic!("Expected zero interval to be rejected"),
    }
}

#[test]
fn config_rejects_unparseable_catalog_url() {
    let dir = TempDir::new().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
seller_id = "1"

[catalog]
url = "not a url"
"#,
    );

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "catalog.url",
            ..
        }))
    ));
}

#[test]
fn config_rejects_unknown_log_format() {
    let dir = TempDir::new().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
seller_id = "1"

[catalog]
url = "https://catalog.example/{seller_id}"

[logging]
format = "xml"
"#,
    );

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "logging.format",
            ..
        }))
    ));
}

#[test]
fn config_reports_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_temp_config(&dir, "seller_id = ");

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn config_reports_missing_file() {
    let dir = TempDir::new().unwrap();

    assert!(matches!(
        Config::load(dir.path().join("absent.toml")),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[test]
fn cli_overrides_win_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write_temp_config(&dir, FULL);
    let overrides = ConfigOverrides {
        chats_path: Some(PathBuf::from("elsewhere.txt")),
        bot_token: Some("token-from-flag".into()),
        debug: true,
        ..ConfigOverrides::default()
    };

    let config = Config::load_with_overrides(&path, &overrides).unwrap();

    assert_eq!(config.chats.path, PathBuf::from("elsewhere.txt"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("token-from-flag"));
    // Telegram is disabled in the file, so the token stays inactive.
    assert!(config.telegram.active_token().is_none());
}
