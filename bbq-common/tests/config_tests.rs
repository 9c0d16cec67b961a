//! Configuration and root folder resolution tests
//!
//! Tests that touch BBQ_ROOT_FOLDER are marked #[serial] so they never
//! race on the process environment.

use bbq_common::config::{
    default_root_folder, RootFolderInitializer, RootFolderResolver, TomlConfig, ROOT_FOLDER_ENV,
};
use bbq_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn config_with_root(path: &str) -> TomlConfig {
    TomlConfig {
        root_folder: Some(PathBuf::from(path)),
        ..TomlConfig::default()
    }
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = RootFolderResolver::new("test").resolve();
    assert_eq!(resolved, default_root_folder());
}

#[test]
#[serial]
fn test_cli_arg_beats_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let resolved = RootFolderResolver::new("test")
        .with_cli_arg(Some(PathBuf::from("/from/cli")))
        .with_toml_config(&config_with_root("/from/toml"))
        .resolve();

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let resolved = RootFolderResolver::new("test")
        .with_toml_config(&config_with_root("/from/toml"))
        .resolve();

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_blank_env_falls_through_to_toml() {
    env::set_var(ROOT_FOLDER_ENV, "   ");

    let resolved = RootFolderResolver::new("test")
        .with_toml_config(&config_with_root("/from/toml"))
        .resolve();

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolved, PathBuf::from("/from/toml"));
}

#[test]
fn test_initializer_creates_nested_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("a").join("b");

    let init = RootFolderInitializer::new(root.clone());
    init.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(init.database_path(), root.join("bbq.db"));

    // Second call is a no-op
    init.ensure_directory_exists().unwrap();
}

#[test]
fn test_load_reads_every_section() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/bbq"

        [server]
        host = "0.0.0.0"
        port = 8080

        [feed]
        url = "http://localhost:9000/map.csv"
        user_agent = "test-agent"
        timeout_secs = 5

        [sync]
        interval_hours = 12

        [import]
        batch_size = 100

        [auth]
        trust_all = true

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/bbq")));
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.feed.url, "http://localhost:9000/map.csv");
    assert_eq!(config.feed.user_agent, "test-agent");
    assert_eq!(config.feed.timeout_secs, 5);
    assert_eq!(config.sync.interval_hours, 12);
    assert_eq!(config.import.batch_size, 100);
    assert!(config.auth.trust_all);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = TomlConfig::load(&temp.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let err = TomlConfig::from_toml_str("[server\nport = ").unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = TomlConfig::from_toml_str("[feed]\nurl = \"  \"").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
