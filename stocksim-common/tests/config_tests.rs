//! Configuration resolution tests
//!
//! Tests that touch STOCKSIM_CONFIG are marked #[serial] so they don't race
//! on the process environment.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use stocksim_common::config::{ConfigResolver, ConfigSource, MarketSourceKind, TomlConfig, CONFIG_ENV_VAR};
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_path_beats_environment() {
    let cli = write_config("[server]\nport = 9100\n");
    let envf = write_config("[server]\nport = 9200\n");
    env::set_var(CONFIG_ENV_VAR, envf.path());

    let resolver = ConfigResolver::new(Some(cli.path().to_path_buf()));
    let config = resolver.load().unwrap().config;
    assert_eq!(config.server.port, 9100);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_used_without_cli() {
    let envf = write_config("[market]\nsource = \"fixed\"\n[market.fixed_prices]\n\"TCS.NS\" = 3500.5\n");
    env::set_var(CONFIG_ENV_VAR, envf.path());

    let resolver = ConfigResolver::new(None);
    assert_eq!(resolver.config_path(), Some(envf.path().to_path_buf()));
    let config = resolver.load().unwrap().config;
    assert_eq!(config.market.source, MarketSourceKind::Fixed);
    assert_eq!(config.market.fixed_prices.get("TCS.NS"), Some(&3500.5));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing: PathBuf = dir.path().join("nope.toml");

    let loaded = ConfigResolver::new(Some(missing.clone())).load().unwrap();
    assert_eq!(loaded.config, TomlConfig::default());
    assert_eq!(loaded.source, ConfigSource::Missing(missing));
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let bad = write_config("[server\nport = ");
    assert!(ConfigResolver::new(Some(bad.path().to_path_buf())).load().is_err());
}

#[test]
fn test_full_document_round_trips_through_toml() {
    let content = r#"
        [server]
        host = "0.0.0.0"
        port = 8080

        [market]
        watchlist = ["TCS.NS", "WIPRO.NS"]
        request_timeout_secs = 3

        [monitor]
        interval_seconds = 2
        threshold_percent = 1.5

        [storage]
        data_folder = "/var/lib/stocksim"

        [logging]
        level = "debug"
    "#;
    let config = TomlConfig::parse(content).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.market.watchlist, vec!["TCS.NS", "WIPRO.NS"]);
    assert_eq!(config.market.min_request_interval_ms, 200);
    assert_eq!(config.monitor.threshold_percent, 1.5);
    assert_eq!(
        config.storage.database_path(),
        PathBuf::from("/var/lib/stocksim/stocksim.db")
    );
    assert_eq!(config.logging.level, "debug");
}
