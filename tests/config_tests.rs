use quit_habit::{AppConfig, ConfigError};
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_without_any_settings() {
    let config = AppConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.http_addr, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
    assert_eq!(config.database_path, PathBuf::from("quit_habit.db"));
    assert!(!config.password_required());
}

#[test]
fn environment_overrides_file_values() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "http_addr = \"127.0.0.1:8080\"\ndatabase_path = \"/tmp/from-file.db\"\napp_password = \"file-secret\"\nlog_filter = \"debug\""
    )
    .unwrap();
    let path = file.path().to_string_lossy().to_string();

    let config = AppConfig::from_lookup(lookup(&[
        ("QUIT_HABIT_CONFIG", path.as_str()),
        ("QUIT_HABIT_HTTP_ADDR", "127.0.0.1:9090"),
        ("APP_PASSWORD", "env-secret"),
    ]))
    .unwrap();

    assert_eq!(config.http_addr, "127.0.0.1:9090".parse::<SocketAddr>().unwrap());
    assert_eq!(config.database_path, PathBuf::from("/tmp/from-file.db"));
    assert_eq!(config.app_password.as_deref(), Some("env-secret"));
    assert_eq!(config.log_filter, "debug");
}

#[test]
fn database_url_is_a_fallback_for_the_database_path() {
    let config = AppConfig::from_lookup(lookup(&[(
        "DATABASE_URL",
        "sqlite:///var/lib/quit_habit.db",
    )]))
    .unwrap();
    assert_eq!(config.database_path, PathBuf::from("var/lib/quit_habit.db"));

    let config = AppConfig::from_lookup(lookup(&[
        ("DATABASE_URL", "sqlite:///ignored.db"),
        ("QUIT_HABIT_DATABASE", "habits.db"),
    ]))
    .unwrap();
    assert_eq!(config.database_path, PathBuf::from("habits.db"));

    let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://db/habits")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn empty_password_disables_the_gate() {
    let config = AppConfig::from_lookup(lookup(&[("APP_PASSWORD", "")])).unwrap();
    assert!(!config.password_required());
}

#[test]
fn invalid_values_are_rejected() {
    let err = AppConfig::from_lookup(lookup(&[("QUIT_HABIT_HTTP_ADDR", "not-an-addr")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let err = AppConfig::from_toml_str("session_cookie = \"bad cookie\"").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let err = AppConfig::from_toml_str("http_addr = 5").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = AppConfig::from_lookup(lookup(&[("QUIT_HABIT_CONFIG", "/nonexistent/quit.toml")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
