//! Configuration loading and resolution
//!
//! Config file resolution order:
//! 1. Command-line `--config` path (highest priority)
//! 2. `STOCKSIM_CONFIG` environment variable
//! 3. Platform config dir (`~/.config/stocksim/config.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: a warning is logged and the
//! compiled defaults are used. A file that exists but fails to parse is an
//! error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "STOCKSIM_CONFIG";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// NSE tickers tracked by default
pub const DEFAULT_WATCHLIST: [&str; 4] = ["RELIANCE.NS", "TCS.NS", "INFY.NS", "HDFCBANK.NS"];

pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_ALERT_THRESHOLD_PERCENT: f64 = 5.0;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_DATABASE_FILE: &str = "stocksim.db";

/// Which price source backs the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketSourceKind {
    /// Live quotes from the Yahoo Finance chart API
    #[default]
    Yahoo,
    /// Prices taken from `market.fixed_prices` (offline mode)
    Fixed,
}

impl std::str::FromStr for MarketSourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "fixed" => Ok(Self::Fixed),
            other => Err(Error::Config(format!(
                "Unknown market source '{}' (expected 'yahoo' or 'fixed')",
                other
            ))),
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// `[market]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSection {
    pub source: MarketSourceKind,
    pub watchlist: Vec<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Minimum spacing between outgoing quote requests
    pub min_request_interval_ms: u64,
    /// Prices served by the fixed source, keyed by symbol
    pub fixed_prices: BTreeMap<String, f64>,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            source: MarketSourceKind::default(),
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            request_timeout_secs: 10,
            min_request_interval_ms: 200,
            fixed_prices: BTreeMap::new(),
        }
    }
}

/// `[monitor]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    pub interval_seconds: u64,
    pub threshold_percent: f64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_MONITOR_INTERVAL_SECS,
            threshold_percent: DEFAULT_ALERT_THRESHOLD_PERCENT,
        }
    }
}

/// `[storage]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Folder holding the database; platform default when absent
    pub data_folder: Option<PathBuf>,
    pub database_file: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_folder: None,
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

impl StorageSection {
    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_folder
            .clone()
            .unwrap_or_else(default_data_folder)
            .join(&self.database_file)
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete contents of `config.toml`; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerSection,
    pub market: MarketSection,
    pub monitor: MonitorSection,
    pub storage: StorageSection,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if self.monitor.interval_seconds == 0 {
            return Err(Error::Config(
                "monitor.interval_seconds must be at least 1".to_string(),
            ));
        }
        let threshold = self.monitor.threshold_percent;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(Error::Config(format!(
                "monitor.threshold_percent must be positive, got {}",
                threshold
            )));
        }
        if self.market.watchlist.iter().all(|s| s.trim().is_empty()) {
            return Err(Error::Config("market.watchlist must not be empty".to_string()));
        }
        if let Some((symbol, price)) = self
            .market
            .fixed_prices
            .iter()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(Error::Config(format!(
                "market.fixed_prices.{} must be positive, got {}",
                symbol, price
            )));
        }
        Ok(())
    }
}

/// Locates and loads the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Path that would be loaded, following the resolution order
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        default_config_path()
    }

    /// Load the resolved config file, falling back to defaults if it is missing
    ///
    /// Does not log: binaries load config before the tracing subscriber
    /// exists and report [`ConfigSource`] afterwards.
    pub fn load(&self) -> Result<LoadedConfig> {
        match self.config_path() {
            Some(path) if path.exists() => Ok(LoadedConfig {
                config: TomlConfig::load(&path)?,
                source: ConfigSource::File(path),
            }),
            Some(path) => Ok(LoadedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Missing(path),
            }),
            None => Ok(LoadedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Defaults,
            }),
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// Resolved path does not exist; compiled defaults in use
    Missing(PathBuf),
    /// No config directory on this platform; compiled defaults in use
    Defaults,
}

impl ConfigSource {
    /// Log how the configuration was obtained
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            ),
            ConfigSource::Defaults => {
                warn!("No config directory on this platform, using compiled defaults")
            }
        }
    }
}

/// Result of [`ConfigResolver::load`]
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stocksim").join("config.toml"))
}

/// Platform data folder (`~/.local/share/stocksim` on Linux)
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("stocksim"))
        .unwrap_or_else(|| PathBuf::from("./stocksim_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = TomlConfig::parse("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.monitor.interval_seconds, 5);
        assert_eq!(config.market.watchlist.len(), 4);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = TomlConfig::parse("[monitor]\nthreshold_percent = 2.5\n").unwrap();
        assert_eq!(config.monitor.threshold_percent, 2.5);
        assert_eq!(config.monitor.interval_seconds, 5);
        assert_eq!(config.market.source, MarketSourceKind::Yahoo);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = TomlConfig::parse("[monitor]\ninterval_seconds = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_negative_fixed_price_rejected() {
        let toml = "[market.fixed_prices]\n\"TCS.NS\" = -1.0\n";
        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("Fixed".parse::<MarketSourceKind>().unwrap(), MarketSourceKind::Fixed);
        assert_eq!("yahoo".parse::<MarketSourceKind>().unwrap(), MarketSourceKind::Yahoo);
        assert!("bloomberg".parse::<MarketSourceKind>().is_err());
    }

    #[test]
    fn test_database_path_uses_data_folder() {
        let storage = StorageSection {
            data_folder: Some(PathBuf::from("/tmp/sim")),
            database_file: "x.db".to_string(),
        };
        assert_eq!(storage.database_path(), PathBuf::from("/tmp/sim/x.db"));
    }
}
